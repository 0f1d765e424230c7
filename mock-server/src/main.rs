use tokio::net::TcpListener;

/// Standalone items API for exercising the client by hand.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let addr = match std::env::args().nth(1) {
        Some(addr) => addr,
        None => "127.0.0.1:3000".to_string(),
    };
    let listener = TcpListener::bind(&addr).await?;
    println!("mock items API on http://{}", listener.local_addr()?);
    mock_server::run(listener).await
}
