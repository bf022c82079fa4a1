//! Zebra mobile label printer.
//!
//! Print requests are rendered to the printer's line-oriented command
//! language. A label is a header, an optional Code 128 barcode, an optional
//! QR code and any number of text lines, stacked top to bottom.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DriverKind, ParseResponse, SensorDriver};
use crate::config::PrinterLayout;
use crate::types::{ParamBundle, ParamValue, ParameterSpec, RawPacket};
use crate::{DriverError, Result};

pub const LABEL_HEIGHT: &str = "LABEL-HEIGHT";
pub const BARCODE: &str = "BARCODE";
pub const QRCODE: &str = "QRCODE";
pub const TEXT_STRINGS: &str = "TEXT-STRINGS";

const LINE_END: &str = "\r\n";

/// Alphanumeric capacity per QR version at medium error correction.
const QR_CAPACITY_M: [usize; 40] = [
    20, 38, 61, 90, 122, 154, 178, 221, 262, 311, 366, 419, 483, 528, 600, 656, 734, 816, 909,
    970, 1035, 1134, 1248, 1326, 1451, 1542, 1637, 1732, 1839, 1994, 2113, 2238, 2369, 2506, 2632,
    2780, 2894, 3054, 3220, 3391,
];

/// Zero-based QR level for a payload of `len` characters.
///
/// Storage is estimated as `len` plus 20%. Payloads beyond the largest
/// version's capacity get level 40.
pub fn qr_version(len: usize) -> usize {
    let storage = len + len / 5;
    QR_CAPACITY_M.iter().position(|&cap| cap > storage).unwrap_or(QR_CAPACITY_M.len())
}

/// Content of one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    /// Label height in dots; `None` or zero computes it from the content
    pub label_height: Option<u32>,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub text_lines: Vec<String>,
}

impl PrintRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label_height(mut self, height: u32) -> Self {
        self.label_height = Some(height);
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_qr_code(mut self, qr_code: impl Into<String>) -> Self {
        self.qr_code = Some(qr_code.into());
        self
    }

    pub fn with_text_line(mut self, line: impl Into<String>) -> Self {
        self.text_lines.push(line.into());
        self
    }

    /// Barcode, if present and non-empty.
    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref().filter(|s| !s.is_empty())
    }

    /// QR payload, if present and non-empty.
    pub fn qr_code(&self) -> Option<&str> {
        self.qr_code.as_deref().filter(|s| !s.is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.barcode().is_some() || self.qr_code().is_some() || !self.text_lines.is_empty()
    }

    /// Build a request from host parameters.
    ///
    /// `TEXT-STRINGS` may be a string array or a nested bundle keyed `"1"`
    /// through `"n"`. A gap in the nested keys is an error.
    pub fn from_params(params: &ParamBundle) -> Result<Self> {
        let label_height = params.int(LABEL_HEIGHT).filter(|h| *h > 0).map(|h| h as u32);

        let text_lines = match params.get(TEXT_STRINGS) {
            None => Vec::new(),
            Some(ParamValue::StrArray(lines)) => lines.clone(),
            Some(ParamValue::Bundle(indexed)) => (1..=indexed.len())
                .map(|i| {
                    indexed.string(&i.to_string()).map(str::to_owned).ok_or_else(|| {
                        DriverError::malformed_print_request(format!(
                            "text line {} not specified",
                            i
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(DriverError::malformed_print_request(format!(
                    "{} must be a string array, found {}",
                    TEXT_STRINGS,
                    other.type_name()
                )));
            }
        };

        Ok(Self {
            label_height,
            barcode: params.string(BARCODE).map(str::to_owned),
            qr_code: params.string(QRCODE).map(str::to_owned),
            text_lines,
        })
    }
}

impl TryFrom<&ParamBundle> for PrintRequest {
    type Error = DriverError;

    fn try_from(params: &ParamBundle) -> Result<Self> {
        Self::from_params(params)
    }
}

/// Label printer driver. Output only; it never produces records.
#[derive(Debug, Clone, Default)]
pub struct LabelPrinter {
    layout: PrinterLayout,
}

impl LabelPrinter {
    pub fn new(layout: PrinterLayout) -> Self {
        Self { layout }
    }

    /// Height in dots of a QR block, caption row included.
    pub fn qr_height(&self, qr_code: &str) -> u32 {
        let level = qr_version(qr_code.chars().count()) as u32;
        let modules = 21 + 4 * (level + 1);
        modules * self.layout.qr_module_dpi + self.layout.text_line_height
    }

    /// Height the label will be printed at.
    pub fn label_height(&self, request: &PrintRequest) -> u32 {
        if let Some(height) = request.label_height.filter(|h| *h > 0) {
            return height;
        }

        let mut height = self.layout.top_margin;
        if request.barcode().is_some() {
            height += self.layout.barcode_height;
        }
        if let Some(qr) = request.qr_code() {
            height += self.qr_height(qr);
        }
        height += request.text_lines.len() as u32 * self.layout.text_line_height;
        debug!("calculated label height: {}", height);
        height
    }

    /// Render the command text for a request.
    pub fn render(&self, request: &PrintRequest) -> Result<String> {
        if !request.has_content() {
            return Err(DriverError::malformed_print_request(
                "no barcode, QR code or text lines to print",
            ));
        }

        let mut out = format!(
            "! 0 200 200 {} 1{LINE_END} ON-FEED IGNORE{LINE_END} ENCODING UTF-8{LINE_END}",
            self.label_height(request)
        );

        let mut y = self.layout.top_margin;
        if let Some(barcode) = request.barcode() {
            out.push_str(&format!("BARCODE 128 1 1 45 0 {} {}{LINE_END}", y, barcode));
            y += self.layout.barcode_height;
        }

        if let Some(qr) = request.qr_code() {
            out.push_str(&format!(
                "BARCODE QR 0 {} M 2 U {}{LINE_END}",
                y, self.layout.qr_module_dpi
            ));
            out.push_str(&format!("MA,{}{LINE_END}", qr));
            out.push_str(&format!("ENDQR{LINE_END}"));
            y += self.qr_height(qr);
        }

        for line in &request.text_lines {
            out.push_str(&format!("TEXT 7 0 0 {} {} {LINE_END}", y, line));
            y += self.layout.text_line_height;
        }

        out.push_str(&format!("PRINT {LINE_END}"));
        Ok(out)
    }
}

impl SensorDriver for LabelPrinter {
    fn kind(&self) -> DriverKind {
        DriverKind::LabelPrinter
    }

    fn parameters(&self) -> ParameterSpec {
        ParameterSpec::empty()
    }

    fn decode(&self, _packets: &[RawPacket], _remainder: &[u8]) -> Result<ParseResponse> {
        Ok(ParseResponse::default())
    }

    fn encode(&self, request: &PrintRequest) -> Result<Vec<u8>> {
        self.render(request).map(String::into_bytes)
    }
}
