//! What a caller submits for one attempt.

use serde::{Deserialize, Serialize};
use sprout_gesture::Frame;
use sprout_types::{ActivityType, GeoPoint, InputError, PlantId, Timestamp};

fn one() -> u32 {
    1
}

/// Raw evidence for one attempt.
///
/// At least one of `image`, `video` or `gesture_frames` must be present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default, with = "hex_bytes")]
    pub image: Option<Vec<u8>>,
    #[serde(default, with = "hex_bytes")]
    pub video: Option<Vec<u8>>,
    #[serde(default)]
    pub gesture_frames: Option<Vec<Frame>>,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Daylight as seen by the capture device.
    #[serde(default)]
    pub observed_daylight: Option<bool>,
    /// When the evidence was captured. Only seeds the gesture signature: the
    /// ledger always books an attempt on the day it arrives. A time in the
    /// future is clamped to arrival; one older than the capture-age limit is
    /// refused.
    #[serde(default)]
    pub captured_at: Option<Timestamp>,
}

impl Evidence {
    pub fn new() -> Self {
        Self {
            quantity: 1,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.image = Some(bytes.into());
        self
    }

    pub fn with_video(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.video = Some(bytes.into());
        self
    }

    pub fn with_gesture_frames(mut self, frames: Vec<Frame>) -> Self {
        self.gesture_frames = Some(frames);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_observed_daylight(mut self, daylight: bool) -> Self {
        self.observed_daylight = Some(daylight);
        self
    }

    pub fn captured_at(mut self, at: Timestamp) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Bytes handed to the content classifier: the image, else the video.
    pub fn media(&self) -> Option<&[u8]> {
        self.image.as_deref().or(self.video.as_deref())
    }

    /// Reject evidence that cannot be evaluated at all.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.image.is_none() && self.video.is_none() && self.gesture_frames.is_none() {
            return Err(InputError::NoEvidence);
        }
        if self.image.as_ref().is_some_and(|b| b.is_empty()) {
            return Err(InputError::EmptyEvidence("image"));
        }
        if self.video.as_ref().is_some_and(|b| b.is_empty()) {
            return Err(InputError::EmptyEvidence("video"));
        }
        if self.gesture_frames.as_ref().is_some_and(|f| f.is_empty()) {
            return Err(InputError::EmptyEvidence("gesture frames"));
        }
        if self.quantity == 0 {
            return Err(InputError::ZeroQuantity);
        }
        Ok(())
    }

    /// The capture instant, clamped to `now`, or an error if it is older
    /// than `max_age_secs`.
    pub fn capture_time(&self, now: Timestamp, max_age_secs: u64) -> Result<Timestamp, InputError> {
        let Some(at) = self.captured_at else {
            return Ok(now);
        };
        let age_secs = at.elapsed_since(now);
        if age_secs > max_age_secs {
            return Err(InputError::StaleEvidence { age_secs, max_secs: max_age_secs });
        }
        Ok(at.min(now))
    }
}

/// A submission as it arrives over the wire, before parsing.
///
/// `claimed_location` accepts the free-form formats of [`GeoPoint::parse`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub plant_id: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub claimed_location: Option<String>,
    pub evidence: Evidence,
}

impl Submission {
    pub fn plant(&self) -> Result<PlantId, InputError> {
        PlantId::parse(self.plant_id.as_str())
    }

    pub fn location(&self) -> Result<Option<GeoPoint>, InputError> {
        self.claimed_location.as_deref().map(GeoPoint::parse).transpose()
    }
}

/// Binary payloads travel as hex strings in JSON.
mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_some(&hex::encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|h| hex::decode(h).map_err(D::Error::custom))
            .transpose()
    }
}
