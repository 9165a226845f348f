use byteorder::{BigEndian, ByteOrder};

use crate::error::Error;
use crate::msg::{HEADER_SIZE, MAGIC_NUMBER, SCHEMA_VERSION};
use crate::Result;

#[cfg(test)]
mod test;

/// 文字列フィールドの長さプレフィクスで「値なし」を表す値です。
pub const NULL_STRING_LENGTH: i32 = -1;

/// バイト列を先頭から順にフィールドとして読み出すためのカーソルです。
///
/// すべての読み込みはフィールド単位でアトミックに行われ、読み込みに失敗した場合カーソルは移動しません。
#[derive(Debug)]
pub struct FieldReader<'a> {
  buffer: &'a [u8],
  position: usize,
}

impl<'a> FieldReader<'a> {
  /// 指定されたバッファに対するリーダーを構築し、カーソルを 8 バイトの共通ヘッダの直後に移動します。
  pub fn new(buffer: &'a [u8]) -> Result<FieldReader<'a>> {
    if buffer.len() < HEADER_SIZE {
      return Err(Error::BufferUnderflow {
        field: "header",
        position: 0,
        required: HEADER_SIZE,
        remaining: buffer.len(),
      });
    }
    Ok(FieldReader { buffer, position: HEADER_SIZE })
  }

  /// 次に読み込むバイトの位置を参照します。
  pub fn position(&self) -> usize {
    self.position
  }

  /// 未読のバイト数を参照します。
  pub fn remaining(&self) -> usize {
    self.buffer.len() - self.position
  }

  /// バッファをすべて読み終えている場合 true を返します。
  pub fn at_end(&self) -> bool {
    self.position >= self.buffer.len()
  }

  pub fn read_i8(&mut self) -> Result<i8> {
    self.take("QInt8", 1).map(|b| b[0] as i8)
  }

  pub fn read_u8(&mut self) -> Result<u8> {
    self.take("QUInt8", 1).map(|b| b[0])
  }

  /// 1 バイトの真偽値を読み込みます。0 以外は true として扱います。
  pub fn read_bool(&mut self) -> Result<bool> {
    self.take("QBool", 1).map(|b| b[0] != 0)
  }

  pub fn read_i16(&mut self) -> Result<i16> {
    self.take("QInt16", 2).map(BigEndian::read_i16)
  }

  pub fn read_u16(&mut self) -> Result<u16> {
    self.take("QUInt16", 2).map(BigEndian::read_u16)
  }

  pub fn read_i32(&mut self) -> Result<i32> {
    self.take("QInt32", 4).map(BigEndian::read_i32)
  }

  pub fn read_u32(&mut self) -> Result<u32> {
    self.take("QUInt32", 4).map(BigEndian::read_u32)
  }

  pub fn read_i64(&mut self) -> Result<i64> {
    self.take("QInt64", 8).map(BigEndian::read_i64)
  }

  pub fn read_f64(&mut self) -> Result<f64> {
    self.take("QFloat", 8).map(BigEndian::read_f64)
  }

  /// 4 バイトの長さプレフィクスに続く UTF-8 文字列を読み込みます。長さが -1 の場合は `None` を返します。
  ///
  /// 長さプレフィクスは読めたが本体が不足している場合や UTF-8 として不正な場合も、カーソルは長さプレフィクスの
  /// 前の位置に留まります。
  pub fn read_string(&mut self) -> Result<Option<String>> {
    let start = self.position;
    let length = self.read_i32()?;
    if length == NULL_STRING_LENGTH {
      return Ok(None);
    }
    let result = self.read_string_body(length);
    if result.is_err() {
      self.position = start;
    }
    result.map(Some)
  }

  fn read_string_body(&mut self, length: i32) -> Result<String> {
    // -1 以外の負の長さは残りバイト数を超える長さとして扱う
    let length = if length < 0 { usize::MAX } else { length as usize };
    let position = self.position;
    let bytes = self.take("QString", length)?;
    match std::str::from_utf8(bytes) {
      Ok(text) => Ok(text.to_string()),
      Err(_) => {
        self.position = position;
        Err(Error::IllegalUtf8 { position })
      }
    }
  }

  /// 指定されたバイト数を切り出してカーソルを進めます。不足している場合はカーソルを動かさずにエラーを返します。
  fn take(&mut self, field: &'static str, width: usize) -> Result<&'a [u8]> {
    let remaining = self.remaining();
    if width > remaining {
      let position = self.position;
      return Err(Error::BufferUnderflow { field, position, required: width, remaining });
    }
    let buffer: &'a [u8] = self.buffer;
    let bytes = &buffer[self.position..self.position + width];
    self.position += width;
    Ok(bytes)
  }
}

/// 送信用のメッセージをフィールド単位で追記しながら構築するためのライターです。
///
/// 構築時にマジックナンバーとスキーマバージョンからなる共通ヘッダが書き込まれます。`into_bytes()` で
/// 取り出した後は再利用できません。
#[derive(Debug)]
pub struct FieldWriter {
  buffer: Vec<u8>,
}

impl FieldWriter {
  /// サポートしている最新のスキーマバージョンでライターを構築します。
  pub fn new() -> FieldWriter {
    FieldWriter::with_schema(SCHEMA_VERSION)
  }

  /// 指定されたスキーマバージョンをヘッダに書き込んだライターを構築します。
  pub fn with_schema(schema: i32) -> FieldWriter {
    let mut writer = FieldWriter { buffer: Vec::with_capacity(64) };
    writer.write_u32(MAGIC_NUMBER);
    writer.write_i32(schema);
    writer
  }

  pub fn write_i8(&mut self, value: i8) {
    self.buffer.push(value as u8);
  }

  pub fn write_u8(&mut self, value: u8) {
    self.buffer.push(value);
  }

  pub fn write_bool(&mut self, value: bool) {
    self.buffer.push(if value { 1 } else { 0 });
  }

  pub fn write_i16(&mut self, value: i16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_i16(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  pub fn write_u16(&mut self, value: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  pub fn write_i32(&mut self, value: i32) {
    let mut bytes = [0u8; 4];
    BigEndian::write_i32(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  pub fn write_u32(&mut self, value: u32) {
    let mut bytes = [0u8; 4];
    BigEndian::write_u32(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  pub fn write_i64(&mut self, value: i64) {
    let mut bytes = [0u8; 8];
    BigEndian::write_i64(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  pub fn write_f64(&mut self, value: f64) {
    let mut bytes = [0u8; 8];
    BigEndian::write_f64(&mut bytes, value);
    self.buffer.extend_from_slice(&bytes);
  }

  /// UTF-8 のバイト長を 4 バイトのプレフィクスとして書き込み、続けて文字列本体を書き込みます。
  pub fn write_string(&mut self, value: &str) -> Result<()> {
    let maximum = i32::MAX as usize;
    if value.len() > maximum {
      return Err(Error::StringTooLong { length: value.len(), maximum });
    }
    self.write_i32(value.len() as i32);
    self.buffer.extend_from_slice(value.as_bytes());
    Ok(())
  }

  /// `None` の場合は長さ -1 のみを書き込みます。
  pub fn write_optional_string(&mut self, value: Option<&str>) -> Result<()> {
    match value {
      Some(value) => self.write_string(value),
      None => {
        self.write_i32(NULL_STRING_LENGTH);
        Ok(())
      }
    }
  }

  /// 構築したバイト列を取り出します。
  pub fn into_bytes(self) -> Vec<u8> {
    self.buffer
  }
}
