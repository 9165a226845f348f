use std::time::SystemTime;

use crate::error::Error;
use crate::Result;


const UPPER: &[u8; 24] = b"ABCDEFGHIJKLMNOPQRSTUVWX";
const LOWER: &[u8; 24] = b"abcdefghijklmnopqrstuvwx";

/// 符号付きの 10 進度で表した緯度・経度を 6 文字の Maidenhead グリッドロケータに変換します。
///
/// 経度は -180 以上 180 未満、緯度は -90 以上 90 未満である必要があります。
pub fn to_grid(latitude: f64, longitude: f64) -> Result<String> {
  if !(-180.0..180.0).contains(&longitude) {
    let message = format!("longitude must be -180<=lon<180, given {}", longitude);
    return Err(Error::IllegalCoordinate { message });
  }
  if !(-90.0..90.0).contains(&latitude) {
    let message = format!("latitude must be -90<=lat<90, given {}", latitude);
    return Err(Error::IllegalCoordinate { message });
  }

  let lat = latitude + 90.0;
  let lon = longitude + 180.0;

  let lon_remainder = (lon - (lon / 2.0).trunc() * 2.0) * 60.0;
  let lat_remainder = (lat - lat.trunc()) * 60.0;

  let grid = [
    UPPER[index(lon / 20.0)],
    UPPER[index(lat / 10.0)],
    b'0' + ((lon / 2.0) % 10.0) as u8,
    b'0' + (lat % 10.0) as u8,
    LOWER[index(lon_remainder / 5.0)],
    LOWER[index(lat_remainder / 2.5)],
  ];
  Ok(grid.iter().map(|c| *c as char).collect())
}

fn index(value: f64) -> usize {
  (value as usize).min(UPPER.len() - 1)
}

/// NMEA の `ddmm.mmmm` (経度は `dddmm.mmmm`) 形式の値と N/S/E/W の方位を符号付きの 10 進度に変換します。
pub fn nmea_to_degrees(value: &str, direction: &str) -> Result<f64> {
  let sign = match direction {
    "N" | "E" => 1.0,
    "S" | "W" => -1.0,
    _ => {
      let message = format!("invalid direction specifier: {:?}", direction);
      return Err(Error::IllegalNmea { message });
    }
  };
  let illegal =
    || Error::IllegalNmea { message: format!("invalid value for lat/long: {:?}", value) };
  if value.len() < 3 || !value.is_ascii() {
    return Err(illegal());
  }
  let dot = value.find('.').ok_or_else(illegal)?;
  if dot < 3 {
    return Err(illegal());
  }
  let degrees = value[..dot - 2].parse::<f64>().map_err(|_| illegal())?;
  let minutes = value[dot - 2..].parse::<f64>().map_err(|_| illegal())?;
  Ok(sign * (degrees + minutes / 60.0))
}

/// `$GPGLL` または `$GPGGA` センテンスからグリッドロケータを求めます。測位が有効でない場合や他のセンテンス、
/// 不正なセンテンスの場合は `None` を返します。
pub fn nmea_to_grid(sentence: &str) -> Option<String> {
  let body = sentence.trim_end().split('*').next().unwrap_or("");
  let fields = body.split(',').collect::<Vec<&str>>();
  // (緯度のインデックス, 測位状態のインデックス, 有効を示す測位状態)
  let (lat, status, valid) = match fields[0] {
    "$GPGLL" => (1, 6, "A"),
    "$GPGGA" => (2, 6, "1"),
    _ => return None,
  };
  if fields.len() <= status || fields[status] != valid {
    log::trace!("no valid GPS fix: {}", body);
    return None;
  }
  match fields_to_grid(&fields[lat..lat + 4]) {
    Ok(grid) => Some(grid),
    Err(err) => {
      log::debug!("{}: {}", err, body);
      None
    }
  }
}

/// 緯度、N/S、経度、E/W の 4 フィールドをグリッドロケータに変換します。
fn fields_to_grid(fields: &[&str]) -> Result<String> {
  let latitude = nmea_to_degrees(fields[0], fields[1])?;
  let longitude = nmea_to_degrees(fields[2], fields[3])?;
  to_grid(latitude, longitude)
}

/// GPS レシーバから届く NMEA センテンスを監視して現在のグリッドロケータを保持します。
#[derive(Debug, Default)]
pub struct NmeaLocation {
  grid: Option<String>,
  valid: bool,
  last_fix_at: Option<SystemTime>,
}

impl NmeaLocation {
  pub fn new() -> NmeaLocation {
    NmeaLocation::default()
  }

  /// 最後に得られたグリッドロケータ。
  pub fn grid(&self) -> Option<&str> {
    self.grid.as_deref()
  }

  /// 直近の位置センテンスが有効な測位を示していた場合 true を返します。
  pub fn is_valid(&self) -> bool {
    self.valid
  }

  pub fn last_fix_at(&self) -> Option<SystemTime> {
    self.last_fix_at
  }

  /// 1 行のセンテンスを処理します。グリッドロケータが変化した場合にのみ新しいロケータを返します。
  pub fn handle_line(&mut self, line: &str) -> Option<String> {
    if !(line.starts_with("$GPGLL") || line.starts_with("$GPGGA")) {
      return None;
    }
    log::trace!("nmea gps sentence: {}", line.trim_end());
    match nmea_to_grid(line) {
      Some(grid) => {
        self.valid = true;
        self.last_fix_at = Some(SystemTime::now());
        if self.grid.as_deref() == Some(grid.as_str()) {
          return None;
        }
        log::debug!("grid changed: {:?} -> {}", self.grid, grid);
        self.grid = Some(grid.clone());
        Some(grid)
      }
      None => {
        self.valid = false;
        None
      }
    }
  }

  /// シリアルポートから読み込んだ 1 行分のバイト列を処理します。`$` で始まらない行や UTF-8 として不正な行は
  /// 無視します。
  pub fn handle_bytes(&mut self, line: &[u8]) -> Option<String> {
    if !line.starts_with(b"$") {
      return None;
    }
    match std::str::from_utf8(line) {
      Ok(line) => self.handle_line(line),
      Err(err) => {
        log::debug!("{} - line: {:02x?}", err, line);
        None
      }
    }
  }
}
