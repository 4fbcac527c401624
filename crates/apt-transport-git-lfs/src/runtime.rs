//! Protocol engine: announces capabilities and serves requests until the
//! parent closes stdin.

use std::io;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::app::fetch::{AcquireRequest, FetchOrchestrator};
use crate::domain::configuration::parse_config_items;
use crate::domain::message::{Header, Message, MessageCode};
use crate::error::MethodError;
use crate::infra::stdio::{MessageReader, MessageWriter};

/// Protocol version announced in `100 Capabilities`.
pub const PROTOCOL_VERSION: &str = "1.1";

/// Serialized request loop over one reader/writer pair.
pub struct MethodEngine<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    orchestrator: FetchOrchestrator,
}

impl<R, W> MethodEngine<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates the engine and immediately sends `100 Capabilities`.
    ///
    /// # Errors
    /// Returns an error when the capabilities message cannot be written.
    pub async fn start(reader: R, writer: W, orchestrator: FetchOrchestrator) -> io::Result<Self> {
        let mut writer = MessageWriter::new(writer);
        let capabilities = Message::new(MessageCode::Capabilities)
            .with_header(Header::Version, PROTOCOL_VERSION)
            .with_header(Header::SingleInstance, "true")
            .with_header(Header::SendConfig, "true");
        writer.send(&capabilities).await?;

        Ok(Self {
            reader: MessageReader::new(reader),
            writer,
            orchestrator,
        })
    }

    /// Handles messages one at a time until the input stream ends.
    ///
    /// Request failures are reported to the parent and never end the loop.
    ///
    /// # Errors
    /// Returns an error only when reading the input or writing the output
    /// stream fails.
    pub async fn run(&mut self) -> io::Result<()> {
        while let Some(lines) = self.reader.read_message().await? {
            self.dispatch(&lines).await?;
        }
        info!("Input closed, exiting");

        Ok(())
    }

    /// Consumes the engine and returns the output stream.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    async fn dispatch(&mut self, lines: &[String]) -> io::Result<()> {
        let message = match Message::parse(lines) {
            Ok(message) => message,
            Err(malformed) => {
                warn!(reason = %malformed.reason, "Rejecting malformed request");
                let failure = unsupported_request(malformed.uri, &malformed.status_line);

                return self.writer.send(&failure).await;
            }
        };
        let uri = message.header(Header::Uri).map(ToString::to_string);

        let result = match message.kind() {
            Some(MessageCode::Configuration) => {
                self.configure(&message);
                Ok(())
            }
            Some(MessageCode::UriAcquire) => self.acquire(&message).await,
            _ => {
                warn!(status_line = %message.status_line(), "Rejecting unsupported request");
                let failure = unsupported_request(uri, &message.status_line());

                return self.writer.send(&failure).await;
            }
        };

        if let Err(error) = result {
            error!(?error, uri = uri.as_deref().unwrap_or_default(), "Request failed");
            let failure = Message::new(MessageCode::UriFailure)
                .with_optional_header(Header::Uri, uri)
                .with_header(Header::Message, format!("{}: {error}", error.kind()));
            self.writer.send(&failure).await?;
        }

        Ok(())
    }

    fn configure(&mut self, message: &Message) {
        let items = message.header_values(Header::ConfigItem);
        debug!(count = items.len(), "Applying configuration");
        self.orchestrator.apply_configuration(parse_config_items(items));
    }

    async fn acquire(&mut self, message: &Message) -> Result<(), MethodError> {
        let request = AcquireRequest::from_message(message)?;

        self.orchestrator.acquire(&request, &mut self.writer).await
    }
}

fn unsupported_request(uri: Option<String>, status_line: &str) -> Message {
    Message::new(MessageCode::UriFailure)
        .with_optional_header(Header::Uri, uri)
        .with_header(Header::Message, format!("Unsupported request: {status_line}"))
}
