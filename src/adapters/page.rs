//! Configuration page channel.
//!
//! [`PageQueue`] is the [`ConfigPageChannel`] the tick loop polls.  The
//! HTTP server runs in its own task, so frames cross over through a
//! mutex-guarded queue:
//!
//! ```text
//!  browser ──ws──▶ handler ──push_inbound──▶ PageQueue ──poll──▶ Router
//!  browser ◀──ws── detached sender ◀──send── PageQueue ◀──────── Router
//! ```
//!
//! On `target_os = "espidf"`, [`serve`] starts `EspHttpServer` with the page
//! at `/` and the WebSocket at `/ws`.  On the host, outbound frames are
//! collected for inspection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::config_page::PageText;
use crate::app::ports::ConfigPageChannel;
use crate::osc::message::truncated;

/// Inbound frames kept while the tick loop is busy.  Older frames are
/// dropped first.
const INBOX_DEPTH: usize = 4;

#[derive(Default)]
struct Shared {
    inbox: VecDeque<PageText>,
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<String>,
    #[cfg(target_os = "espidf")]
    sender: Option<esp_idf_svc::http::server::ws::EspHttpWsDetachedSender>,
}

#[derive(Clone, Default)]
pub struct PageQueue {
    shared: Arc<Mutex<Shared>>,
}

impl PageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a frame received from the page.
    pub fn push_inbound(&self, text: &str) {
        let mut shared = self.lock();
        if shared.inbox.len() == INBOX_DEPTH {
            debug!("Page: inbox full, dropping oldest frame");
            shared.inbox.pop_front();
        }
        shared.inbox.push_back(truncated(text));
    }

    /// Simulation: frames sent to the page so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }
}

impl ConfigPageChannel for PageQueue {
    fn poll(&mut self) -> Option<PageText> {
        self.lock().inbox.pop_front()
    }

    fn send(&mut self, text: &str) {
        let mut shared = self.lock();

        #[cfg(not(target_os = "espidf"))]
        shared.sent.push(text.to_string());

        #[cfg(target_os = "espidf")]
        if let Some(sender) = shared.sender.as_mut() {
            use esp_idf_svc::ws::FrameType;
            if let Err(e) = sender.send(FrameType::Text(false), text.as_bytes()) {
                debug!("Page: send failed ({:?}), dropping client", e);
                shared.sender = None;
            }
        }
    }
}

/// Start the HTTP server for the configuration page.  Keep the returned
/// server alive for as long as the page should be reachable.
#[cfg(target_os = "espidf")]
pub fn serve(
    queue: &PageQueue,
) -> Result<esp_idf_svc::http::server::EspHttpServer<'static>, esp_idf_svc::sys::EspError> {
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;
    use esp_idf_svc::ws::FrameType;

    const PAGE: &str = include_str!("../../assets/config.html");

    let mut server = EspHttpServer::new(&Configuration::default())?;

    server.fn_handler("/", Method::Get, |req| {
        req.into_ok_response()?.write_all(PAGE.as_bytes())
    })?;

    let queue = queue.clone();
    server.ws_handler("/ws", move |ws| {
        if ws.is_new() {
            queue.lock().sender = Some(ws.create_detached_sender()?);
            log::info!("Page: client connected");
            return Ok(());
        }
        if ws.is_closed() {
            queue.lock().sender = None;
            return Ok(());
        }

        let mut buf = [0u8; 512];
        let (frame_type, len) = ws.recv(&mut buf)?;
        if let FrameType::Text(_) = frame_type {
            // Text frames are NUL-terminated by the IDF server.
            let text = core::str::from_utf8(&buf[..len])
                .unwrap_or_default()
                .trim_end_matches('\0');
            queue.push_inbound(text);
        }
        Ok::<(), esp_idf_svc::sys::EspError>(())
    })?;

    Ok(server)
}
