//! Camera collaborator configuration.
//!
//! The camera and decoder live outside this crate. What the scanner owns is
//! the configuration handed to them: which symbology to accept and which
//! part of the preview to decode from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Barcode symbologies a decoder can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeFormat {
    /// Code 128 (linear)
    #[default]
    Code128,
    /// Code 39 (linear)
    Code39,
    /// Code 93 (linear)
    Code93,
    /// Codabar (linear)
    Codabar,
    /// EAN-8 (linear)
    Ean8,
    /// EAN-13 (linear)
    Ean13,
    /// Interleaved 2 of 5 (linear)
    Itf,
    /// UPC-A (linear)
    UpcA,
    /// UPC-E (linear)
    UpcE,
    /// QR code (2D)
    Qr,
    /// PDF417 (2D)
    Pdf417,
}

impl BarcodeFormat {
    /// Every known format, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Code128,
        Self::Code39,
        Self::Code93,
        Self::Codabar,
        Self::Ean8,
        Self::Ean13,
        Self::Itf,
        Self::UpcA,
        Self::UpcE,
        Self::Qr,
        Self::Pdf417,
    ];

    /// Configuration name (`code128`, `ean13`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code128 => "code128",
            Self::Code39 => "code39",
            Self::Code93 => "code93",
            Self::Codabar => "codabar",
            Self::Ean8 => "ean8",
            Self::Ean13 => "ean13",
            Self::Itf => "itf",
            Self::UpcA => "upca",
            Self::UpcE => "upce",
            Self::Qr => "qr",
            Self::Pdf417 => "pdf417",
        }
    }

    /// Whether the symbology is one-dimensional.
    #[must_use]
    pub const fn is_linear(self) -> bool {
        !matches!(self, Self::Qr | Self::Pdf417)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A format name that matched no known symbology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown barcode format: {0}")]
pub struct UnknownBarcodeFormat(pub String);

impl FromStr for BarcodeFormat {
    type Err = UnknownBarcodeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| UnknownBarcodeFormat(s.to_string()))
    }
}

/// Device screen size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

/// On-screen scan frame in points, measured from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanFrame {
    /// Distance from the left edge
    pub left: f64,
    /// Distance from the top edge
    pub top: f64,
    /// Frame width
    pub width: f64,
    /// Frame height
    pub height: f64,
}

impl Default for ScanFrame {
    fn default() -> Self {
        Self {
            left: 50.0,
            top: 150.0,
            width: 300.0,
            height: 100.0,
        }
    }
}

/// Fractional region of the camera image the decoder should read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectOfInterest {
    /// Origin x, 0..=1
    pub x: f64,
    /// Origin y, 0..=1
    pub y: f64,
    /// Width, 0..=1
    pub width: f64,
    /// Height, 0..=1
    pub height: f64,
}

impl RectOfInterest {
    /// The whole image.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Map an on-screen frame to the camera's coordinate space.
    ///
    /// The camera sensor is landscape while the screen is portrait, so the
    /// axes are swapped: screen `top` becomes sensor `x` and screen `left`
    /// becomes sensor `y`. A degenerate screen yields [`Self::FULL`].
    #[must_use]
    pub fn from_frame(frame: ScanFrame, screen: ScreenSize) -> Self {
        if screen.width <= 0.0 || screen.height <= 0.0 {
            return Self::FULL;
        }

        Self {
            x: frame.top / screen.width,
            y: frame.left / screen.height,
            width: frame.height / screen.width,
            height: frame.width / screen.height,
        }
    }
}

/// Configuration handed to the camera collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// The only symbology decodes are accepted for
    pub format: BarcodeFormat,
    /// Region of the image to decode from
    pub rect_of_interest: RectOfInterest,
}

impl ScannerSettings {
    /// Settings for `format` with the default scan frame on `screen`.
    #[must_use]
    pub fn new(format: BarcodeFormat, screen: ScreenSize) -> Self {
        Self {
            format,
            rect_of_interest: RectOfInterest::from_frame(ScanFrame::default(), screen),
        }
    }

    /// Whether a decode in `format` should be processed.
    #[must_use]
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.format == format
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::new(
            BarcodeFormat::default(),
            ScreenSize {
                width: 390.0,
                height: 844.0,
            },
        )
    }
}
