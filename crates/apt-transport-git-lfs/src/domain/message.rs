//! Typed representation of the APT method protocol messages.
//!
//! A message is a status line `"<code> <text>"` followed by `"Key: value"`
//! header lines. Header names the method understands are modelled by
//! [`Header`]; anything else is kept verbatim in an extension list so that it
//! survives parsing without ad hoc lookups.

/// Protocol message codes exchanged with the parent process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageCode {
    /// Sent once at startup to announce method features.
    Capabilities,
    /// Progress notice for a pending request.
    Status,
    /// Download started; carries size and timestamp.
    UriStart,
    /// Download finished; carries file metadata and digests.
    UriDone,
    /// Request failed.
    UriFailure,
    /// Parent asks for one URI to be fetched.
    UriAcquire,
    /// Parent pushes configuration items.
    Configuration,
}

impl MessageCode {
    /// Returns the numeric protocol code.
    pub fn number(self) -> u16 {
        match self {
            Self::Capabilities => 100,
            Self::Status => 102,
            Self::UriStart => 200,
            Self::UriDone => 201,
            Self::UriFailure => 400,
            Self::UriAcquire => 600,
            Self::Configuration => 601,
        }
    }

    /// Returns the canonical human-readable name rendered after the code.
    pub fn name(self) -> &'static str {
        match self {
            Self::Capabilities => "Capabilities",
            Self::Status => "Status",
            Self::UriStart => "URI Start",
            Self::UriDone => "URI Done",
            Self::UriFailure => "URI Failure",
            Self::UriAcquire => "URI Acquire",
            Self::Configuration => "Configuration",
        }
    }

    /// Maps a numeric code back to a known message code.
    pub fn from_number(number: u16) -> Option<Self> {
        [
            Self::Capabilities,
            Self::Status,
            Self::UriStart,
            Self::UriDone,
            Self::UriFailure,
            Self::UriAcquire,
            Self::Configuration,
        ]
        .into_iter()
        .find(|code| code.number() == number)
    }
}

/// Header names recognized by the method.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Header {
    Uri,
    Filename,
    ConfigItem,
    Message,
    FailReason,
    Size,
    LastModified,
    Md5Hash,
    Md5SumHash,
    Sha256Hash,
    Sha512Hash,
    Version,
    SingleInstance,
    SendConfig,
}

impl Header {
    const ALL: [Self; 14] = [
        Self::Uri,
        Self::Filename,
        Self::ConfigItem,
        Self::Message,
        Self::FailReason,
        Self::Size,
        Self::LastModified,
        Self::Md5Hash,
        Self::Md5SumHash,
        Self::Sha256Hash,
        Self::Sha512Hash,
        Self::Version,
        Self::SingleInstance,
        Self::SendConfig,
    ];

    /// Returns the header name as written on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uri => "URI",
            Self::Filename => "Filename",
            Self::ConfigItem => "Config-Item",
            Self::Message => "Message",
            Self::FailReason => "FailReason",
            Self::Size => "Size",
            Self::LastModified => "Last-Modified",
            Self::Md5Hash => "MD5-Hash",
            Self::Md5SumHash => "MD5Sum-Hash",
            Self::Sha256Hash => "SHA256-Hash",
            Self::Sha512Hash => "SHA512-Hash",
            Self::Version => "Version",
            Self::SingleInstance => "Single-Instance",
            Self::SendConfig => "Send-Config",
        }
    }

    /// Resolves a wire header name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|header| header.as_str().eq_ignore_ascii_case(name))
    }
}

/// Request that could not be parsed into a [`Message`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("malformed message `{status_line}`: {reason}")]
pub struct MalformedMessage {
    /// Literal first line of the rejected request.
    pub status_line: String,
    /// `URI` header value, when one could still be read.
    pub uri: Option<String>,
    /// Human-readable parse failure.
    pub reason: String,
}

/// One protocol message with ordered, possibly repeated headers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    code: u16,
    text: String,
    headers: Vec<(Header, Vec<String>)>,
    extensions: Vec<(String, Vec<String>)>,
}

impl Message {
    /// Creates an outgoing message whose status text is the code's name.
    pub fn new(code: MessageCode) -> Self {
        Self {
            code: code.number(),
            text: code.name().to_string(),
            headers: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Appends `value` under `header` and returns the message.
    #[must_use]
    pub fn with_header(mut self, header: Header, value: impl Into<String>) -> Self {
        self.push_header(header, value);

        self
    }

    /// Appends `value` under `header` when present; `None` leaves the header
    /// out of the encoded message entirely.
    #[must_use]
    pub fn with_optional_header(self, header: Header, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with_header(header, value),
            None => self,
        }
    }

    /// Appends `value` to the values already stored under `header`.
    pub fn push_header(&mut self, header: Header, value: impl Into<String>) {
        let value = value.into();
        match self.headers.iter_mut().find(|(name, _)| *name == header) {
            Some((_, values)) => values.push(value),
            None => self.headers.push((header, vec![value])),
        }
    }

    /// Returns the numeric code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the known message code, if the numeric code is recognized.
    pub fn kind(&self) -> Option<MessageCode> {
        MessageCode::from_number(self.code)
    }

    /// Returns the literal status line, e.g. `600 URI Acquire`.
    pub fn status_line(&self) -> String {
        if self.text.is_empty() {
            return self.code.to_string();
        }

        format!("{} {}", self.code, self.text)
    }

    /// Returns the first value stored under `header`.
    pub fn header(&self, header: Header) -> Option<&str> {
        self.header_values(header).first().map(String::as_str)
    }

    /// Returns all values stored under `header` in arrival order.
    pub fn header_values(&self, header: Header) -> &[String] {
        self.headers
            .iter()
            .find(|(name, _)| *name == header)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Returns all values of an unrecognized header.
    pub fn extension_values(&self, name: &str) -> &[String] {
        self.extensions
            .iter()
            .find(|(extension, _)| extension == name)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Parses the raw lines of one message, status line first.
    ///
    /// # Errors
    /// Returns [`MalformedMessage`] when the status line has no numeric code
    /// or a header line has no `:` separator.
    pub fn parse(lines: &[String]) -> Result<Self, MalformedMessage> {
        let status_line = lines.first().map(String::as_str).unwrap_or_default();
        let mut message = Self {
            code: 0,
            text: String::new(),
            headers: Vec::new(),
            extensions: Vec::new(),
        };
        let mut failure = None;

        for line in lines.iter().skip(1) {
            let Some((name, value)) = line.split_once(':') else {
                failure.get_or_insert_with(|| format!("header line `{line}` has no `:`"));
                continue;
            };
            let name = name.trim();
            let value = value.trim().to_string();
            match Header::from_name(name) {
                Some(header) => message.push_header(header, value),
                None => message.push_extension(name, value),
            }
        }

        let (code, text) = status_line
            .split_once(' ')
            .unwrap_or((status_line, ""));
        match code.parse::<u16>() {
            Ok(code) => {
                message.code = code;
                message.text = text.trim().to_string();
            }
            Err(_) => {
                failure = Some(format!("status line `{status_line}` has no numeric code"));
            }
        }

        match failure {
            Some(reason) => Err(MalformedMessage {
                status_line: status_line.to_string(),
                uri: message.header(Header::Uri).map(ToString::to_string),
                reason,
            }),
            None => Ok(message),
        }
    }

    /// Renders the message in wire form, including the terminating blank
    /// line.
    ///
    /// Values spanning several lines are folded onto one line so captured
    /// command output cannot break message framing.
    pub fn encode(&self) -> String {
        let mut encoded = self.status_line();
        encoded.push('\n');

        let known = self
            .headers
            .iter()
            .map(|(header, values)| (header.as_str(), values));
        let extensions = self
            .extensions
            .iter()
            .map(|(name, values)| (name.as_str(), values));
        for (name, values) in known.chain(extensions) {
            for value in values {
                encoded.push_str(name);
                encoded.push_str(": ");
                encoded.push_str(&fold_lines(value));
                encoded.push('\n');
            }
        }
        encoded.push('\n');

        encoded
    }

    fn push_extension(&mut self, name: &str, value: String) {
        match self
            .extensions
            .iter_mut()
            .find(|(extension, _)| extension == name)
        {
            Some((_, values)) => values.push(value),
            None => self.extensions.push((name.to_string(), vec![value])),
        }
    }
}

/// Joins the non-empty lines of `value` with single spaces.
fn fold_lines(value: &str) -> String {
    if !value.contains(['\n', '\r']) {
        return value.to_string();
    }

    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
