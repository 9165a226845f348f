use rand;
use rand::prelude::StdRng;
use rand::{RngCore, SeedableRng};

/// 文字列のサンプル値に使用する文字。マルチバイト文字を含む。
const CHARACTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 -:/<>~グリッド";

/// 一様にランダムなテスト用の値を採集するための構造体。シードを指定することでランダムだが決定論的な値を生成する。
pub struct SampleValues {
  rng: Box<StdRng>,
}

impl SampleValues {
  /// シードを指定してサンプル値ジェネレータを初期化します。
  pub fn new(seed: u64) -> SampleValues {
    let mut s = [0u8; 32];
    for i in 0..8 {
      s[i] = ((seed >> (i * 8)) & 0xFF) as u8
    }
    SampleValues { rng: Box::new(rand::rngs::StdRng::from_seed(s)) }
  }

  pub fn next_bool(&mut self) -> bool {
    (self.rng.next_u32() & 0x01) != 0
  }

  pub fn next_u8(&mut self) -> u8 {
    (self.rng.next_u32() & 0xFF) as u8
  }

  pub fn next_i8(&mut self) -> i8 {
    self.next_u8() as i8
  }

  pub fn next_u16(&mut self) -> u16 {
    (self.rng.next_u32() & 0xFFFF) as u16
  }

  pub fn next_u32(&mut self) -> u32 {
    self.rng.next_u32()
  }

  pub fn next_i32(&mut self) -> i32 {
    self.rng.next_u32() as i32
  }

  pub fn next_i64(&mut self) -> i64 {
    self.rng.next_u64() as i64
  }

  /// 有限の浮動小数点値を生成します。
  pub fn next_f64(&mut self) -> f64 {
    self.next_i32() as f64 / 1024.0
  }

  pub fn next_bytes(&mut self, length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    self.rng.fill_bytes(&mut bytes);
    bytes
  }

  /// 最大 `max_chars` 文字のランダムな文字列を生成します。
  pub fn next_string(&mut self, max_chars: usize) -> String {
    let characters = CHARACTERS.chars().collect::<Vec<char>>();
    let length = self.rng.next_u32() as usize % (max_chars + 1);
    (0..length).map(|_| characters[self.rng.next_u32() as usize % characters.len()]).collect()
  }

  /// 1/4 の確率で `None` となる文字列を生成します。
  pub fn next_optional_string(&mut self, max_chars: usize) -> Option<String> {
    if self.rng.next_u32() % 4 == 0 {
      None
    } else {
      Some(self.next_string(max_chars))
    }
  }
}

#[test]
fn test_sample_values() {
  // シードによって乱数が変動する
  let seeds = [0u64, 1, 2, 3, 4, 5, 100, 200];
  for i in 1..seeds.len() {
    let mut s1 = SampleValues::new(seeds[i - 1]);
    let mut s2 = SampleValues::new(seeds[i]);
    assert_ne!(s1.next_u32(), s2.next_u32());
    assert_ne!(s1.next_i64(), s2.next_i64());
    assert_ne!(s1.next_bytes(256), s2.next_bytes(256));
  }

  // 指定した長さのバイト配列を作成している
  let mut sample = SampleValues::new(783629830u64);
  assert_eq!(sample.next_bytes(1024).len(), 1024);

  // 文字列は指定した文字数を超えない
  for _ in 0..100 {
    assert!(sample.next_string(8).chars().count() <= 8);
  }
}
