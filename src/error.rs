use thiserror::Error as ThisError;

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("not enough data to extract {field}: {required} bytes required at {position}, {remaining} remaining")]
  BufferUnderflow { field: &'static str, position: usize, required: usize, remaining: usize },
  #[error("illegal UTF-8 sequence in string field at {position}")]
  IllegalUtf8 { position: usize },

  #[error("packet too small: {length} bytes, min={minimum}")]
  PacketTooSmall { length: usize, minimum: usize },
  #[error("packet too large: {length} bytes, max={maximum}")]
  PacketTooLarge { length: usize, maximum: usize },
  #[error("bad magic: {value:#010X}")]
  BadMagic { value: u32 },
  #[error("unsupported schema: {schema}, supported={minimum}..={maximum}")]
  UnsupportedSchema { schema: i32, minimum: i32, maximum: i32 },
  #[error("unknown kind: {kind}")]
  UnknownKind { kind: i32 },

  #[error("string too long for its length prefix: {length}, max={maximum}")]
  StringTooLong { length: usize, maximum: usize },
  #[error("the {kind} message cannot be built by this codec")]
  NotOutbound { kind: &'static str },

  #[error("unsupported protocol: {url}")]
  UnsupportedProtocol { url: String },
  #[error("host not specified in url: {url}")]
  HostNotSpecifiedInUrl { url: String },
  #[error("illegal address: {message}")]
  IllegalAddress { message: String },

  #[error("illegal coordinate: {message}")]
  IllegalCoordinate { message: String },
  #[error("illegal NMEA field: {message}")]
  IllegalNmea { message: String },

  #[error("failed to configure logger: {message}")]
  Logging { message: String },
  #[error("underlying I/O layer error: {message}")]
  Io { kind: std::io::ErrorKind, message: String },
}

impl Error {
  /// フィールドの読み込みに必要なバイト数がバッファに残っていないことを示すエラーの場合 true を返します。
  pub fn is_underflow(&self) -> bool {
    matches!(self, Error::BufferUnderflow { .. })
  }

  /// 文字列フィールドのバイト列が UTF-8 として不正であることを示すエラーの場合 true を返します。
  pub fn is_decode(&self) -> bool {
    matches!(self, Error::IllegalUtf8 { .. })
  }

  /// ヘッダやデータグラムのサイズなど、プロトコル上の制約違反を示すエラーの場合 true を返します。
  pub fn is_protocol(&self) -> bool {
    matches!(
      self,
      Error::PacketTooSmall { .. }
        | Error::PacketTooLarge { .. }
        | Error::BadMagic { .. }
        | Error::UnsupportedSchema { .. }
        | Error::UnknownKind { .. }
    )
  }
}

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Error {
    Error::Io { kind: err.kind(), message: err.to_string() }
  }
}

impl From<url::ParseError> for Error {
  fn from(err: url::ParseError) -> Error {
    Error::IllegalAddress { message: err.to_string() }
  }
}

impl From<std::net::AddrParseError> for Error {
  fn from(err: std::net::AddrParseError) -> Error {
    Error::IllegalAddress { message: err.to_string() }
  }
}
