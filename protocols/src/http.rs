/// Ports where the server waits for a request before saying anything.
pub const CLIENT_FIRST_PORTS: &[u16] = &[
    80, 81, 591, 3000, 5000, 8000, 8008, 8080, 8081, 8088, 8888, 9000,
];

pub fn is_client_first(port: u16) -> bool {
    CLIENT_FIRST_PORTS.contains(&port)
}

/// A minimal `HEAD` request, enough to make an HTTP server send its status line and headers.
pub fn head_request(host: &str) -> Vec<u8> {
    let host_header = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    format!("HEAD / HTTP/1.0\r\nHost: {host_header}\r\n\r\n").into_bytes()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
