use std::net::{IpAddr, Ipv4Addr, UdpSocket};

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Devine l'adresse IP locale de la machine.
///
/// Un socket UDP est "connecté" vers un DNS public : aucun paquet n'est
/// émis, mais le système choisit l'interface de sortie, dont on lit
/// l'adresse. Retourne `127.0.0.1` si la machine n'a pas de route.
///
/// Utilisé pour afficher aux invités l'URL à laquelle rejoindre la fête.
pub fn guess_local_ip() -> String {
    outbound_ip().unwrap_or(LOOPBACK).to_string()
}

fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() { None } else { Some(ip) }
}
