//! Seam to the external image-generation service.

use crate::error::GenerationError;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for async operations (not `Send`; the browser is single-threaded).
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Wide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Wide => "16:9",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        AspectRatio::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Canvas size for a new image item with this ratio.
    pub fn item_size(self) -> (f64, f64) {
        match self {
            AspectRatio::Square => (300.0, 300.0),
            AspectRatio::Landscape => (400.0, 300.0),
            AspectRatio::Portrait => (300.0, 400.0),
            AspectRatio::Wide => (480.0, 270.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub aspect_ratio: AspectRatio,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub base64_data: String,
    pub mime_type: String,
}

pub trait ImageGenerator {
    fn generate(&self, request: ImageRequest) -> LocalBoxFuture<'_, Result<GeneratedImage, GenerationError>>;
}

/// Stand-in used when no image service has been wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredGenerator;

impl ImageGenerator for UnconfiguredGenerator {
    fn generate(&self, _request: ImageRequest) -> LocalBoxFuture<'_, Result<GeneratedImage, GenerationError>> {
        Box::pin(async { Err(GenerationError::NotConfigured) })
    }
}

/// Ticket identifying one in-flight generation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Sequence guard for overlapping requests: only the most recently issued
/// ticket is current, so a slow earlier response can never overwrite a
/// newer one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestGate {
    latest: u64,
}

impl RequestGate {
    pub fn begin(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Invalidates every outstanding ticket.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}
