//! HTTP task
//!
//! Serves the parameter endpoint on one TCP socket, one request per
//! connection.

use defmt::*;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::Duration;
use embedded_io_async::Write;

use stepgate_core::http::{Endpoint, RequestOutcome, REQUEST_CAPACITY, RESPONSE_CAPACITY};
use stepgate_core::mailbox::EnqueueOutcome;
use stepgate_core::params::{MergeDiagnostic, MergeReport};

use crate::channels::{MOTOR_COMMANDS, PARAMETERS};

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP task
#[embassy_executor::task]
pub async fn http_task(stack: Stack<'static>, port: u16) {
    info!("HTTP task started");

    let endpoint = Endpoint::new(&PARAMETERS, &MOTOR_COMMANDS);
    let mut rx_buffer = [0u8; REQUEST_CAPACITY];
    let mut tx_buffer = [0u8; RESPONSE_CAPACITY];
    let mut request = [0u8; REQUEST_CAPACITY];

    stack.wait_config_up().await;
    info!("Listening on port {}", port);

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(port).await {
            warn!("Accept error: {:?}", e);
            continue;
        }

        let n = match socket.read(&mut request).await {
            Ok(0) => {
                debug!("Connection closed before request");
                continue;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("Read error: {:?}", e);
                socket.abort();
                continue;
            }
        };

        let reply = endpoint.handle(&request[..n]);
        log_outcome(&reply.outcome);

        if let Err(e) = socket.write_all(reply.response.as_bytes()).await {
            warn!("Write error: {:?}", e);
            socket.abort();
            continue;
        }
        if let Err(e) = socket.flush().await {
            warn!("Flush error: {:?}", e);
        }
        socket.close();
    }
}

fn log_outcome(outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Status { feedback } => debug!(
            "GET /getParams at {} ({} steps/s)",
            feedback.position, feedback.speed
        ),
        RequestOutcome::Updated {
            params,
            report,
            enqueue,
        } => {
            if !report.is_clean() {
                log_diagnostics(report);
            }

            match enqueue {
                EnqueueOutcome::Queued => info!(
                    "Queued move to {} ({} parameters applied)",
                    params.final_position, report.applied
                ),
                EnqueueOutcome::Dropped => warn!(
                    "Motor queue full, command dropped ({} total)",
                    MOTOR_COMMANDS.dropped()
                ),
            }
        }
        RequestOutcome::NotFound => info!("Unknown endpoint requested"),
    }
}

fn log_diagnostics(report: &MergeReport) {
    for diagnostic in report.diagnostics.iter() {
        match diagnostic {
            MergeDiagnostic::Clamped { key } => {
                warn!("Invalid value for {}, set to 0", key.as_str())
            }
            MergeDiagnostic::InvalidStepMode { value } => {
                warn!("Invalid step mode {}, using full step", value)
            }
            MergeDiagnostic::Unrecognized(name) => {
                warn!("Unrecognized parameter: {}", name.as_str())
            }
        }
    }
    if report.overflowed {
        warn!("More diagnostics than could be recorded");
    }
}
