use crate::{config, error, info, server, warning};

/// Runs the HTTP server until the process is stopped.
///
/// With `open_browser` set, the login page is opened once the socket is
/// bound so a local listener can authorize right away.
pub async fn serve(addr: Option<String>, open_browser: bool) {
    let state = match server::AppState::from_env() {
        Ok(state) => state,
        Err(e) => error!("Failed to build server state. Err: {}", e),
    };

    let addr = addr.unwrap_or_else(config::server_addr);
    let listener = match server::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Cannot listen on {}. Err: {}", addr, e),
    };

    if open_browser {
        let login_url = format!("{}/api/auth/login", state.app_url);
        info!("Opening {} in your browser", login_url);
        if let Err(e) = webbrowser::open(&login_url) {
            warning!("Could not open browser: {}", e);
        }
    }

    if let Err(e) = server::serve(listener, state).await {
        error!("Server stopped. Err: {}", e);
    }
}
