use crate::error::Error;
use crate::msg::codec::stream::{FieldReader, FieldWriter};
use crate::msg::{HEADER_SIZE, MAGIC_NUMBER, SCHEMA_VERSION};
use crate::test::SampleValues;

#[test]
fn test_writer_header() {
  // ライターは構築時にマジックナンバーとスキーマを書き込む
  let bytes = FieldWriter::new().into_bytes();
  assert_eq!(vec![0xAD, 0xBC, 0xCB, 0xDA, 0x00, 0x00, 0x00, 0x03], bytes);

  let bytes = FieldWriter::with_schema(2).into_bytes();
  assert_eq!(vec![0xAD, 0xBC, 0xCB, 0xDA, 0x00, 0x00, 0x00, 0x02], bytes);
}

#[test]
fn test_big_endian_encoding() {
  let mut writer = FieldWriter::new();
  writer.write_i16(-2);
  writer.write_u16(0x1234);
  writer.write_i32(0x0102_0304);
  writer.write_i64(-1);
  writer.write_f64(1.0);
  let bytes = writer.into_bytes();
  assert_eq!(&[0xFF, 0xFE, 0x12, 0x34, 0x01, 0x02, 0x03, 0x04], &bytes[8..16]);
  assert_eq!(&[0xFF; 8], &bytes[16..24]);
  assert_eq!(&[0x3F, 0xF0, 0, 0, 0, 0, 0, 0], &bytes[24..32]);
}

#[test]
fn test_read_written_fields() {
  let mut sample = SampleValues::new(8734597234u64);

  for _ in 0..100 {
    let i8_value = sample.next_i8();
    let u8_value = sample.next_u8();
    let flag = sample.next_bool();
    let i16_value = sample.next_u16() as i16;
    let u16_value = sample.next_u16();
    let i32_value = sample.next_i32();
    let u32_value = sample.next_u32();
    let i64_value = sample.next_i64();
    let f64_value = sample.next_f64();
    let text = sample.next_string(32);

    let mut writer = FieldWriter::new();
    writer.write_i8(i8_value);
    writer.write_u8(u8_value);
    writer.write_bool(flag);
    writer.write_i16(i16_value);
    writer.write_u16(u16_value);
    writer.write_i32(i32_value);
    writer.write_u32(u32_value);
    writer.write_i64(i64_value);
    writer.write_f64(f64_value);
    writer.write_string(&text).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = FieldReader::new(&bytes).unwrap();
    assert_eq!(i8_value, reader.read_i8().unwrap());
    assert_eq!(u8_value, reader.read_u8().unwrap());
    assert_eq!(flag, reader.read_bool().unwrap());
    assert_eq!(i16_value, reader.read_i16().unwrap());
    assert_eq!(u16_value, reader.read_u16().unwrap());
    assert_eq!(i32_value, reader.read_i32().unwrap());
    assert_eq!(u32_value, reader.read_u32().unwrap());
    assert_eq!(i64_value, reader.read_i64().unwrap());
    assert_eq!(f64_value.to_bits(), reader.read_f64().unwrap().to_bits());
    assert_eq!(Some(text), reader.read_string().unwrap());
    assert!(reader.at_end());
  }
}

#[test]
fn test_reader_skips_header() {
  // 8 バイト未満のバッファではリーダーを構築できない
  for length in 0..HEADER_SIZE {
    let buffer = vec![0u8; length];
    let err = FieldReader::new(&buffer).unwrap_err();
    assert!(err.is_underflow());
  }

  // ヘッダのみのバッファは読み込み済みとして扱われる
  let buffer = FieldWriter::new().into_bytes();
  let reader = FieldReader::new(&buffer).unwrap();
  assert_eq!(HEADER_SIZE, reader.position());
  assert_eq!(0, reader.remaining());
  assert!(reader.at_end());
}

#[test]
fn test_underflow_leaves_cursor() {
  let mut writer = FieldWriter::new();
  writer.write_i16(7);
  let bytes = writer.into_bytes();

  let mut reader = FieldReader::new(&bytes).unwrap();
  match reader.read_i32() {
    Err(Error::BufferUnderflow { field, position, required, remaining }) => {
      assert_eq!("QInt32", field);
      assert_eq!(HEADER_SIZE, position);
      assert_eq!(4, required);
      assert_eq!(2, remaining);
    }
    unexpected => panic!("{:?}", unexpected),
  }
  assert_eq!(HEADER_SIZE, reader.position());
  assert!(reader.read_i64().unwrap_err().is_underflow());
  assert!(reader.read_f64().unwrap_err().is_underflow());
  assert_eq!(7, reader.read_i16().unwrap());
  assert!(reader.read_u8().unwrap_err().is_underflow());
  assert!(reader.at_end());
}

#[test]
fn test_null_and_empty_string() {
  let mut writer = FieldWriter::new();
  writer.write_optional_string(None).unwrap();
  writer.write_optional_string(Some("")).unwrap();
  let bytes = writer.into_bytes();
  assert_eq!(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00], &bytes[HEADER_SIZE..]);

  // 長さ -1 は空文字列と区別される
  let mut reader = FieldReader::new(&bytes).unwrap();
  assert_eq!(None, reader.read_string().unwrap());
  assert_eq!(Some(String::new()), reader.read_string().unwrap());
  assert!(reader.at_end());
}

#[test]
fn test_string_length_is_utf8_bytes() {
  let mut writer = FieldWriter::new();
  writer.write_string("グリッド").unwrap();
  let bytes = writer.into_bytes();
  assert_eq!(&[0, 0, 0, 12], &bytes[HEADER_SIZE..HEADER_SIZE + 4]);
  let mut reader = FieldReader::new(&bytes).unwrap();
  assert_eq!(Some("グリッド".to_string()), reader.read_string().unwrap());
}

#[test]
fn test_truncated_string_leaves_cursor() {
  let mut writer = FieldWriter::new();
  writer.write_string("WSJT-X").unwrap();
  let bytes = writer.into_bytes();

  // 長さプレフィクスは読めるが本体が不足している
  for length in HEADER_SIZE..bytes.len() {
    let mut reader = FieldReader::new(&bytes[..length]).unwrap();
    assert!(reader.read_string().unwrap_err().is_underflow());
    assert_eq!(HEADER_SIZE, reader.position());
  }

  // 負の長さ (-1 以外) は不正
  let mut writer = FieldWriter::new();
  writer.write_i32(-2);
  writer.write_string("abc").unwrap();
  let bytes = writer.into_bytes();
  let mut reader = FieldReader::new(&bytes).unwrap();
  assert!(reader.read_string().unwrap_err().is_underflow());
  assert_eq!(HEADER_SIZE, reader.position());
}

#[test]
fn test_illegal_utf8() {
  let mut writer = FieldWriter::new();
  writer.write_i32(3);
  writer.write_u8(0x61);
  writer.write_u8(0xFF);
  writer.write_u8(0x62);
  let bytes = writer.into_bytes();

  let mut reader = FieldReader::new(&bytes).unwrap();
  let err = reader.read_string().unwrap_err();
  assert!(err.is_decode());
  assert_eq!(Error::IllegalUtf8 { position: HEADER_SIZE + 4 }, err);
  assert_eq!(HEADER_SIZE, reader.position());
}

#[test]
fn test_header_constants() {
  let bytes = FieldWriter::new().into_bytes();
  let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
  let schema = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
  assert_eq!(MAGIC_NUMBER, magic);
  assert_eq!(SCHEMA_VERSION, schema);
}
