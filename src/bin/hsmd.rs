//! Process entry point: reads LMK material from the environment, builds the
//! default handler table, and serves the command dispatcher on a TCP port.
//! There is no config-file or CLI surface; everything here is an environment
//! variable with a built-in fallback, matching the "no outer configuration
//! surface" scope decision.

use keycustody::handlers::default_handlers;
use keycustody::variant::LmkSet;
use keycustody::{HSMContext, HsmServer, ServerConfig};
use std::env;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:1500";

fn load_lmk_set() -> LmkSet {
    let Ok(hex_str) = env::var("HSM_LMK") else {
        info!("HSM_LMK not set, using the built-in test LMK set");
        return LmkSet::default_test_set();
    };
    let seed = hex::decode(hex_str.trim()).unwrap_or_else(|e| {
        eprintln!("HSM_LMK is not valid hex: {e}");
        std::process::exit(1);
    });
    LmkSet::from_seed(&seed).unwrap_or_else(|e| {
        eprintln!("HSM_LMK rejected: {e}");
        std::process::exit(1);
    })
}

fn load_aes_lmk() -> Vec<u8> {
    match env::var("HSM_AES_LMK") {
        Ok(hex_str) => match hex::decode(hex_str.trim()) {
            Ok(bytes) if bytes.len() == 16 || bytes.len() == 32 => return bytes,
            Ok(bytes) => warn!(len = bytes.len(), "HSM_AES_LMK must decode to 16 or 32 bytes, ignoring"),
            Err(e) => warn!(error = %e, "HSM_AES_LMK is not valid hex, ignoring"),
        },
        Err(_) => info!("HSM_AES_LMK not set, using a built-in test AES LMK"),
    }
    vec![0x5Au8; 32]
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let lmk_set = load_lmk_set();
    let aes_lmk = load_aes_lmk();
    let pci_mode = env::var("HSM_PCI_MODE").map(|v| v == "1").unwrap_or(false);
    let ctx = HSMContext::new(lmk_set, aes_lmk, pci_mode);

    let bind_addr = env::var("HSM_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, pci_mode, "listening");

    let server = HsmServer::new(ServerConfig::default(), ctx, default_handlers());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let serve_task = tokio::spawn(server.serve(listener, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);
    let _ = serve_task.await;
    Ok(())
}
