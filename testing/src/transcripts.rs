//! Recording fake of the transcript generator.

use async_trait::async_trait;
use helpdesk_core::transcript::{TranscriptError, TranscriptGenerator, TranscriptRef};
use helpdesk_core::types::ChannelId;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    requests: Vec<ChannelId>,
    fail: bool,
}

/// Transcript fake that records requests and can be told to fail.
#[derive(Default)]
pub struct RecordingTranscripts {
    inner: Mutex<Inner>,
}

impl RecordingTranscripts {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Channels a transcript was requested for, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ChannelId> {
        self.lock().requests.clone()
    }

    /// Fail every subsequent generation.
    pub fn fail_all(&self) {
        self.lock().fail = true;
    }
}

#[async_trait]
impl TranscriptGenerator for RecordingTranscripts {
    async fn archive(&self, channel: ChannelId) -> Result<TranscriptRef, TranscriptError> {
        let mut inner = self.lock();
        inner.requests.push(channel);
        if inner.fail {
            return Err(TranscriptError("injected transcript failure".to_owned()));
        }
        Ok(TranscriptRef {
            file_name: format!("transcript-{channel}.html"),
            location: format!("archive://tickets/{channel}"),
        })
    }
}
