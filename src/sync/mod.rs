use std::net::SocketAddr;

use crate::msg::codec::build_location_change;
use crate::msg::{Body, Packet};
use crate::Result;


/// LocationChange で送信するグリッドに付ける接頭辞です。
pub const GRID_PREFIX: &str = "GRID:";

/// 相手アプリケーションに設定されている自局グリッドを GPS から得たグリッドに合わせるための状態機械です。
///
/// 最初の Heartbeat で相手のクライアント ID を記録し、Status の自局グリッドが現在のグリッドと異なる場合に
/// LocationChange を生成します。ソケットやシリアルポートは呼び出し側が扱います。
#[derive(Debug, Default)]
pub struct GridSync {
  client_id: Option<String>,
  grid: Option<String>,
}

impl GridSync {
  pub fn new() -> GridSync {
    GridSync::default()
  }

  /// 最初の Heartbeat から記録した相手のクライアント ID。
  pub fn client_id(&self) -> Option<&str> {
    self.client_id.as_deref()
  }

  pub fn grid(&self) -> Option<&str> {
    self.grid.as_deref()
  }

  /// GPS から得た現在のグリッドを設定します。
  pub fn set_grid(&mut self, grid: &str) {
    if self.grid.as_deref() != Some(grid) {
      log::info!("new grid: {}", grid);
      self.grid = Some(grid.to_string());
    }
  }

  /// 受信したパケットを処理します。相手に送信すべき LocationChange がある場合は宛先とともに返します。
  pub fn on_packet(&mut self, packet: &Packet) -> Result<Option<(SocketAddr, Vec<u8>)>> {
    let msg = match packet {
      Packet::Valid(msg) => msg,
      Packet::Invalid(invalid) => {
        log::debug!("{}", invalid);
        return Ok(None);
      }
    };
    match &msg.body {
      Body::Heartbeat { id: Some(id), .. } if self.client_id.is_none() => {
        log::info!("WSJT-X detected, id is {}", id);
        self.client_id = Some(id.clone());
        Ok(None)
      }
      Body::Status { id, de_grid, .. } => {
        let (grid, destination) = match (&self.grid, msg.source_address) {
          (Some(grid), Some(destination)) => (grid, destination),
          _ => return Ok(None),
        };
        let current = de_grid.as_deref().unwrap_or("");
        if current.eq_ignore_ascii_case(grid) {
          return Ok(None);
        }
        let client_id = match self.client_id.as_deref().or_else(|| id.as_deref()) {
          Some(client_id) => client_id,
          None => return Ok(None),
        };
        log::info!(
          "sending grid change to {}, old grid: {} new grid: {}",
          client_id,
          current,
          grid
        );
        let packet = build_location_change(client_id, &format!("{}{}", GRID_PREFIX, grid))?;
        Ok(Some((destination, packet)))
      }
      _ => Ok(None),
    }
  }
}
