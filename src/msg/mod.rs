use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::SystemTime;

use crate::error::Error;

pub mod codec;

/// すべてのメッセージの先頭に置かれるプロトコル識別用のマジックナンバーです。
pub const MAGIC_NUMBER: u32 = 0xADBC_CBDA;

/// 送信メッセージに書き込むスキーマバージョンです。サポートしている最新のバージョンを表します。
pub const SCHEMA_VERSION: i32 = 3;

/// 受信可能なスキーマバージョンの下限です。
pub const MIN_SCHEMA: i32 = 2;

/// 受信可能なスキーマバージョンの上限です。
pub const MAX_SCHEMA: i32 = 3;

/// マジックナンバーとスキーマバージョンからなる共通ヘッダのバイト長です。
pub const HEADER_SIZE: usize = 8;

/// 共通ヘッダ、種別、および相関 ID を含むプロローグのバイト長です。
pub const PROLOGUE_SIZE: usize = 16;

/// 受信するデータグラムの最小バイト長です。
pub const MIN_MESSAGE_SIZE: usize = HEADER_SIZE;

/// 受信するデータグラムの最大バイト長です。
pub const MAX_MESSAGE_SIZE: usize = 2048;

/// メッセージ種別を表す列挙型です。値はワイヤ上の `int32` 識別子に対応します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Heartbeat,
  Status,
  Decode,
  Clear,
  Reply,
  QsoLogged,
  Close,
  Replay,
  HaltTx,
  FreeText,
  WsprDecode,
  LocationChange,
  LoggedAdif,
}

impl Kind {
  pub const ALL: [Kind; 13] = [
    Kind::Heartbeat,
    Kind::Status,
    Kind::Decode,
    Kind::Clear,
    Kind::Reply,
    Kind::QsoLogged,
    Kind::Close,
    Kind::Replay,
    Kind::HaltTx,
    Kind::FreeText,
    Kind::WsprDecode,
    Kind::LocationChange,
    Kind::LoggedAdif,
  ];

  /// ワイヤ上の識別子に対応する種別を参照します。未知の値の場合は `None` を返します。
  pub fn from_value(value: i32) -> Option<Kind> {
    if value < 0 {
      None
    } else {
      Kind::ALL.get(value as usize).copied()
    }
  }

  pub fn value(self) -> i32 {
    match self {
      Kind::Heartbeat => 0,
      Kind::Status => 1,
      Kind::Decode => 2,
      Kind::Clear => 3,
      Kind::Reply => 4,
      Kind::QsoLogged => 5,
      Kind::Close => 6,
      Kind::Replay => 7,
      Kind::HaltTx => 8,
      Kind::FreeText => 9,
      Kind::WsprDecode => 10,
      Kind::LocationChange => 11,
      Kind::LoggedAdif => 12,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Kind::Heartbeat => "Heartbeat",
      Kind::Status => "Status",
      Kind::Decode => "Decode",
      Kind::Clear => "Clear",
      Kind::Reply => "Reply",
      Kind::QsoLogged => "QSOLogged",
      Kind::Close => "Close",
      Kind::Replay => "Replay",
      Kind::HaltTx => "HaltTx",
      Kind::FreeText => "FreeText",
      Kind::WsprDecode => "WSPRDecode",
      Kind::LocationChange => "LocationChange",
      Kind::LoggedAdif => "LoggedADIF",
    }
  }

  /// コントローラ側から送信できる (このコーデックで構築できる) 種別の場合 true を返します。
  pub fn is_outbound(self) -> bool {
    matches!(self, Kind::Heartbeat | Kind::FreeText | Kind::LocationChange | Kind::LoggedAdif)
  }
}

impl Display for Kind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// 種別ごとに異なるメッセージ本体です。文字列フィールドはワイヤ上で長さ -1 の場合に `None` となります。
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
  Heartbeat {
    /// 送信元アプリケーションのクライアント ID。
    id: Option<String>,
    /// 送信元がサポートする最大のスキーマバージョン。
    max_schema: i32,
    version: i8,
    revision: i8,
  },
  Status {
    id: Option<String>,
    /// ダイヤル周波数 (Hz)。
    dial_frequency: i64,
    mode: Option<String>,
    dx_call: Option<String>,
    report: Option<String>,
    tx_mode: Option<String>,
    tx_enabled: bool,
    transmitting: bool,
    decoding: bool,
    /// 受信オフセット (Hz)。
    rx_df: i32,
    /// 送信オフセット (Hz)。
    tx_df: i32,
    de_call: Option<String>,
    /// 送信元アプリケーションに設定されている自局のグリッドロケータ。
    de_grid: Option<String>,
    dx_grid: Option<String>,
    tx_watchdog: bool,
    sub_mode: Option<String>,
    fast_mode: bool,
    special_op_mode: i8,
  },
  Decode {
    id: Option<String>,
    new_decode: bool,
    /// UTC の午前 0 時からの経過ミリ秒。
    millis_since_midnight: i32,
    /// `millis_since_midnight` を受信時点の UTC 午前 0 時に加算した時刻。
    time: SystemTime,
    snr: i32,
    /// 時刻のずれ (秒)。
    delta_time: f64,
    /// 周波数のずれ (Hz)。
    delta_frequency: i32,
    mode: Option<String>,
    message: Option<String>,
    low_confidence: bool,
    off_air: bool,
  },
  Clear,
  Reply,
  QsoLogged,
  Close,
  Replay,
  HaltTx,
  FreeText {
    id: Option<String>,
    text: Option<String>,
    /// 直ちに送信する場合 true。
    send: bool,
  },
  WsprDecode,
  LocationChange {
    id: Option<String>,
    grid: Option<String>,
  },
  LoggedAdif {
    id: Option<String>,
    adif: Option<String>,
  },
}

impl Body {
  pub fn kind(&self) -> Kind {
    match self {
      Body::Heartbeat { .. } => Kind::Heartbeat,
      Body::Status { .. } => Kind::Status,
      Body::Decode { .. } => Kind::Decode,
      Body::Clear => Kind::Clear,
      Body::Reply => Kind::Reply,
      Body::QsoLogged => Kind::QsoLogged,
      Body::Close => Kind::Close,
      Body::Replay => Kind::Replay,
      Body::HaltTx => Kind::HaltTx,
      Body::FreeText { .. } => Kind::FreeText,
      Body::WsprDecode => Kind::WsprDecode,
      Body::LocationChange { .. } => Kind::LocationChange,
      Body::LoggedAdif { .. } => Kind::LoggedAdif,
    }
  }

  /// 本体がクライアント ID を持つ場合にそれを参照します。
  pub fn client_id(&self) -> Option<&str> {
    match self {
      Body::Heartbeat { id, .. }
      | Body::Status { id, .. }
      | Body::Decode { id, .. }
      | Body::FreeText { id, .. }
      | Body::LocationChange { id, .. }
      | Body::LoggedAdif { id, .. } => id.as_deref(),
      _ => None,
    }
  }
}

/// 受信したデータグラムから復元したメッセージです。構築後に変更されることはありません。
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
  /// データグラムの送信元。
  pub source_address: Option<SocketAddr>,
  /// ヘッダに含まれていたスキーマバージョン。
  pub schema: i32,
  /// プロローグ末尾の 4 バイト。現在のプロトコルでは意味を持たない。
  pub correlation_id: [u8; 4],
  pub body: Body,
}

impl Message {
  pub fn kind(&self) -> Kind {
    self.body.kind()
  }
}

impl Display for Message {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: from {}", self.kind(), display_address(&self.source_address))?;
    match &self.body {
      Body::Heartbeat { id, max_schema, version, revision } => write!(
        f,
        "\n\tid:{}\tmax_schema:{}\tschema:{}\tversion:{}\trevision:{}",
        display_string(id),
        max_schema,
        self.schema,
        version,
        revision
      ),
      Body::Status {
        id, dial_frequency, de_call, de_grid, dx_call, dx_grid, transmitting, decoding, ..
      } => {
        write!(
          f,
          concat!(
            "\n\tid:{}\tde_call:{}\tde_grid:{}",
            "\n\tfrequency:{}\tdx_call:{}\tdx_grid:{}\ttransmitting:{}\tdecoding:{}"
          ),
          display_string(id),
          display_string(de_call),
          display_string(de_grid),
          dial_frequency,
          display_string(dx_call),
          display_string(dx_grid),
          transmitting,
          decoding
        )
      }
      Body::Decode { id, message, snr, delta_frequency, millis_since_midnight, mode, .. } => write!(
        f,
        "\n\tid:{}\tmessage:{}\n\tsnr:{}\tdelta_f:{}\tmillis:{}\tmode:{}",
        display_string(id),
        display_string(message),
        snr,
        delta_frequency,
        millis_since_midnight,
        display_string(mode)
      ),
      Body::FreeText { id, text, send } => {
        write!(f, "\n\tid:{}\ttext:{}\tsend:{}", display_string(id), display_string(text), send)
      }
      Body::LocationChange { id, grid } => {
        write!(f, "\n\tid:{}\tgrid:{}", display_string(id), display_string(grid))
      }
      Body::LoggedAdif { id, adif } => {
        write!(f, "\n\tid:{}\tadif:{}", display_string(id), display_string(adif))
      }
      _ => Ok(()),
    }
  }
}

/// 型付きのメッセージとして復元できなかったデータグラムです。受信したバイト列と理由を保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidPacket {
  pub source_address: Option<SocketAddr>,
  pub packet: Vec<u8>,
  pub error: Error,
}

impl Display for InvalidPacket {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "Invalid Packet: {} from {}", self.error, display_address(&self.source_address))?;
    f.write_str(&hexdump(&self.packet))
  }
}

/// デコーダの結果です。不正なデータグラムもエラーではなく値として返されます。
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
  Valid(Message),
  Invalid(InvalidPacket),
}

impl Packet {
  pub fn source_address(&self) -> Option<SocketAddr> {
    match self {
      Packet::Valid(msg) => msg.source_address,
      Packet::Invalid(invalid) => invalid.source_address,
    }
  }

  pub fn message(&self) -> Option<&Message> {
    match self {
      Packet::Valid(msg) => Some(msg),
      Packet::Invalid(_) => None,
    }
  }

  pub fn is_valid(&self) -> bool {
    matches!(self, Packet::Valid(_))
  }
}

impl Display for Packet {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Packet::Valid(msg) => msg.fmt(f),
      Packet::Invalid(invalid) => invalid.fmt(f),
    }
  }
}

/// 1 行 16 バイトでオフセット、16 進表記、および表示可能な ASCII 文字を並べたダンプを作成します。
pub fn hexdump(bytes: &[u8]) -> String {
  const WIDTH: usize = 16;
  let mut dump = String::with_capacity(bytes.len() / WIDTH * 72 + 72);
  for (i, chunk) in bytes.chunks(WIDTH).enumerate() {
    let hex = chunk.iter().map(|b| format!("{:02x}", b)).collect::<Vec<String>>().join(" ");
    let printable = chunk
      .iter()
      .map(|b| if b.is_ascii_graphic() || *b == b' ' { *b as char } else { '.' })
      .collect::<String>();
    let offset = i * WIDTH;
    dump.push_str(&format!("{:04x}  {:<width$}  {}\n", offset, hex, printable, width = WIDTH * 3));
  }
  dump
}

fn display_address(address: &Option<SocketAddr>) -> String {
  address.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_string(value: &Option<String>) -> &str {
  value.as_deref().unwrap_or("<null>")
}
