use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};

use crate::error::Error;
use crate::msg::codec::stream::{FieldReader, FieldWriter};
use crate::msg::{
  Body, InvalidPacket, Kind, Message, Packet, MAGIC_NUMBER, MAX_MESSAGE_SIZE, MAX_SCHEMA,
  MIN_MESSAGE_SIZE, MIN_SCHEMA, PROLOGUE_SIZE, SCHEMA_VERSION,
};
use crate::Result;

pub mod stream;

/// 種別識別子を読み込んだ直後のリーダーから種別固有のフィールドを読み込んで本体を復元する関数です。
type Parser = fn(&mut FieldReader<'_>) -> Result<Body>;

/// 種別の識別子をインデックスとするパーサのテーブルです。
const PARSERS: [Parser; 13] = [
  parse_heartbeat,
  parse_status,
  parse_decode,
  parse_clear,
  parse_reply,
  parse_qso_logged,
  parse_close,
  parse_replay,
  parse_halt_tx,
  parse_free_text,
  parse_wspr_decode,
  parse_location_change,
  parse_logged_adif,
];

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// 受信したデータグラムをメッセージに復元します。復元できなかった場合も失敗せず、理由と受信したバイト列を
/// 保持した `Packet::Invalid` を返します。
pub fn decode(source_address: Option<SocketAddr>, packet: &[u8]) -> Packet {
  match decode_message(source_address, packet) {
    Ok(msg) => Packet::Valid(msg),
    Err(error) => {
      log::debug!("invalid packet from {:?}: {}", source_address, error);
      Packet::Invalid(InvalidPacket { source_address, packet: packet.to_vec(), error })
    }
  }
}

/// 受信したデータグラムをメッセージに復元します。
///
/// サイズ、マジックナンバー、スキーマバージョン、種別の順に検証し、最初に検出した問題をエラーとして返します。
/// 8 バイト以上 16 バイト未満のデータグラムはプロローグを読み込めないため `BufferUnderflow` となります。
pub fn decode_message(source_address: Option<SocketAddr>, packet: &[u8]) -> Result<Message> {
  if packet.len() < MIN_MESSAGE_SIZE {
    return Err(Error::PacketTooSmall { length: packet.len(), minimum: MIN_MESSAGE_SIZE });
  }
  if packet.len() > MAX_MESSAGE_SIZE {
    return Err(Error::PacketTooLarge { length: packet.len(), maximum: MAX_MESSAGE_SIZE });
  }
  if packet.len() < PROLOGUE_SIZE {
    return Err(Error::BufferUnderflow {
      field: "prologue",
      position: 0,
      required: PROLOGUE_SIZE,
      remaining: packet.len(),
    });
  }

  let magic = BigEndian::read_u32(&packet[0..4]);
  let schema = BigEndian::read_i32(&packet[4..8]);
  let kind = BigEndian::read_i32(&packet[8..12]);
  let mut correlation_id = [0u8; 4];
  correlation_id.copy_from_slice(&packet[12..16]);

  if magic != MAGIC_NUMBER {
    return Err(Error::BadMagic { value: magic });
  }
  if schema < MIN_SCHEMA || schema > MAX_SCHEMA {
    return Err(Error::UnsupportedSchema { schema, minimum: MIN_SCHEMA, maximum: MAX_SCHEMA });
  }
  let parser = parser(kind).ok_or(Error::UnknownKind { kind })?;

  // 種別識別子は各種別のレイアウトの先頭フィールドとして読み直す
  let mut reader = FieldReader::new(packet)?;
  let discriminant = reader.read_i32()?;
  debug_assert_eq!(kind, discriminant);
  let body = parser(&mut reader)?;
  Ok(Message { source_address, schema, correlation_id, body })
}

/// 指定された識別子に対応するパーサを参照します。
fn parser(kind: i32) -> Option<Parser> {
  Kind::from_value(kind).map(|kind| PARSERS[kind.value() as usize])
}

/// 指定されたスキーマバージョンで送信用のメッセージを構築します。コントローラ側から送信できない種別の場合は
/// `NotOutbound` を返します。
pub fn encode(schema: i32, body: &Body) -> Result<Vec<u8>> {
  let kind = body.kind();
  let mut writer = FieldWriter::with_schema(schema);
  writer.write_i32(kind.value());
  match body {
    Body::Heartbeat { id, max_schema, version, revision } => {
      writer.write_optional_string(id.as_deref())?;
      writer.write_i32(*max_schema);
      writer.write_i8(*version);
      writer.write_i8(*revision);
    }
    Body::FreeText { id, text, send } => {
      writer.write_optional_string(id.as_deref())?;
      writer.write_optional_string(text.as_deref())?;
      writer.write_bool(*send);
    }
    Body::LocationChange { id, grid } => {
      writer.write_optional_string(id.as_deref())?;
      writer.write_optional_string(grid.as_deref())?;
    }
    Body::LoggedAdif { id, adif } => {
      writer.write_optional_string(id.as_deref())?;
      writer.write_optional_string(adif.as_deref())?;
    }
    other => return Err(Error::NotOutbound { kind: other.kind().name() }),
  }
  Ok(writer.into_bytes())
}

/// Heartbeat メッセージを構築します。
pub fn build_heartbeat(id: &str, max_schema: i32, version: i8, revision: i8) -> Result<Vec<u8>> {
  let id = Some(id.to_string());
  encode(SCHEMA_VERSION, &Body::Heartbeat { id, max_schema, version, revision })
}

/// 送信するフリーテキストを設定する FreeText メッセージを構築します。
pub fn build_free_text(id: &str, text: &str, send: bool) -> Result<Vec<u8>> {
  let body = Body::FreeText { id: Some(id.to_string()), text: Some(text.to_string()), send };
  encode(SCHEMA_VERSION, &body)
}

/// 自局のグリッドロケータを変更する LocationChange メッセージを構築します。`grid` の書式は検証しません。
pub fn build_location_change(id: &str, grid: &str) -> Result<Vec<u8>> {
  let body = Body::LocationChange { id: Some(id.to_string()), grid: Some(grid.to_string()) };
  encode(SCHEMA_VERSION, &body)
}

/// ADIF 形式の交信記録を通知する LoggedADIF メッセージを構築します。
pub fn build_logged_adif(id: &str, adif: &str) -> Result<Vec<u8>> {
  let body = Body::LoggedAdif { id: Some(id.to_string()), adif: Some(adif.to_string()) };
  encode(SCHEMA_VERSION, &body)
}

/// 指定された時刻を含む日の UTC 午前 0 時を参照します。
pub fn utc_midnight(now: SystemTime) -> SystemTime {
  let millis = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
  UNIX_EPOCH + Duration::from_millis(millis - millis % MILLIS_PER_DAY)
}

/// UTC 午前 0 時からの経過ミリ秒を `now` と同じ日の絶対時刻に変換します。
pub fn time_since_midnight(millis: i32, now: SystemTime) -> SystemTime {
  let midnight = utc_midnight(now);
  let offset = Duration::from_millis(u64::from(millis.unsigned_abs()));
  let time = if millis >= 0 { midnight.checked_add(offset) } else { midnight.checked_sub(offset) };
  time.unwrap_or(midnight)
}

fn parse_heartbeat(reader: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Heartbeat {
    id: reader.read_string()?,
    max_schema: reader.read_i32()?,
    version: reader.read_i8()?,
    revision: reader.read_i8()?,
  })
}

fn parse_status(reader: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Status {
    id: reader.read_string()?,
    dial_frequency: reader.read_i64()?,
    mode: reader.read_string()?,
    dx_call: reader.read_string()?,
    report: reader.read_string()?,
    tx_mode: reader.read_string()?,
    tx_enabled: reader.read_bool()?,
    transmitting: reader.read_bool()?,
    decoding: reader.read_bool()?,
    rx_df: reader.read_i32()?,
    tx_df: reader.read_i32()?,
    de_call: reader.read_string()?,
    de_grid: reader.read_string()?,
    dx_grid: reader.read_string()?,
    tx_watchdog: reader.read_bool()?,
    sub_mode: reader.read_string()?,
    fast_mode: reader.read_bool()?,
    special_op_mode: reader.read_i8()?,
  })
}

fn parse_decode(reader: &mut FieldReader<'_>) -> Result<Body> {
  let id = reader.read_string()?;
  let new_decode = reader.read_bool()?;
  let millis_since_midnight = reader.read_i32()?;
  Ok(Body::Decode {
    id,
    new_decode,
    millis_since_midnight,
    time: time_since_midnight(millis_since_midnight, SystemTime::now()),
    snr: reader.read_i32()?,
    delta_time: reader.read_f64()?,
    delta_frequency: reader.read_i32()?,
    mode: reader.read_string()?,
    message: reader.read_string()?,
    low_confidence: reader.read_bool()?,
    off_air: reader.read_bool()?,
  })
}

fn parse_clear(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Clear)
}

fn parse_reply(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Reply)
}

fn parse_qso_logged(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::QsoLogged)
}

fn parse_close(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Close)
}

fn parse_replay(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::Replay)
}

fn parse_halt_tx(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::HaltTx)
}

fn parse_free_text(reader: &mut FieldReader<'_>) -> Result<Body> {
  let id = reader.read_string()?;
  let text = reader.read_string()?;
  let send = reader.read_bool()?;
  Ok(Body::FreeText { id, text, send })
}

fn parse_wspr_decode(_: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::WsprDecode)
}

fn parse_location_change(reader: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::LocationChange { id: reader.read_string()?, grid: reader.read_string()? })
}

fn parse_logged_adif(reader: &mut FieldReader<'_>) -> Result<Body> {
  Ok(Body::LoggedAdif { id: reader.read_string()?, adif: reader.read_string()? })
}
