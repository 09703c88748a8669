use std::time::Duration;

use tracing::debug;

use crate::orchestrator::outcome::OrchestratorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// `POST /actuator/shutdown` with an empty JSON body. Used for stopping
/// an already-running application server; the caller then waits for the
/// health endpoint to go dark.
pub async fn post_shutdown(host: &str, port: u16) -> Result<(), OrchestratorError> {
    post_actuator(host, port, "shutdown").await
}

/// `POST /actuator/refresh` with an empty JSON body, asking a running
/// server to reload its externalized configuration.
pub async fn post_refresh(host: &str, port: u16) -> Result<(), OrchestratorError> {
    post_actuator(host, port, "refresh").await
}

async fn post_actuator(host: &str, port: u16, endpoint: &str) -> Result<(), OrchestratorError> {
    let url = format!("http://{}:{}/actuator/{}", host, port, endpoint);
    debug!(%url, "posting to actuator endpoint");

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|source| OrchestratorError::RemoteCallFailed {
            url: url.clone(),
            source,
        })?;

    let response = client
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("")
        .send()
        .await
        .map_err(|source| classify(url.clone(), source))?;

    // A server shutting down may drop the connection mid-response; any
    // addressed response counts as delivered.
    debug!(%url, status = %response.status(), "actuator call answered");
    Ok(())
}

fn classify(url: String, source: reqwest::Error) -> OrchestratorError {
    if source.is_timeout() {
        OrchestratorError::Timeout { url, attempts: 1 }
    } else {
        OrchestratorError::RemoteCallFailed { url, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_against_dead_port_is_remote_call_failed() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let err = post_shutdown("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RemoteCallFailed { .. }));
        assert!(err.to_string().contains("/actuator/shutdown"));
    }

    #[tokio::test]
    async fn refresh_reaches_a_live_endpoint() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            assert!(request.starts_with("POST /actuator/refresh"));
            assert!(request.to_lowercase().contains("content-type: application/json"));
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        });

        post_refresh("127.0.0.1", port).await.unwrap();
    }
}
