use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use url::{Host, Url};

use crate::error::Error;
use crate::Result;

pub mod udp;
#[cfg(test)]
mod test;

/// 相手アプリケーションが使用する UDP ポートの既定値です。
pub const DEFAULT_UDP_PORT: u16 = 2237;

/// 相手アプリケーションが既定で送信するマルチキャストグループの URL です。
pub const DEFAULT_URL: &str = "udp://224.0.0.1:2237";

/// UDP ブリッジの設定です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// 受信するアドレス。マルチキャストグループの場合はそのグループに参加する。
  pub address: SocketAddr,
  /// 受信の待機時間。`None` の場合はデータグラムが到着するまで待機する。
  pub timeout: Option<Duration>,
}

impl Config {
  /// `udp://host[:port][?timeout=millis]` 形式の URL から設定を構築します。ポートを省略した場合は 2237 を
  /// 使用します。
  pub fn parse(url: &str) -> Result<Config> {
    let url = Url::parse(url)?;
    if url.scheme() != "udp" {
      return Err(Error::UnsupportedProtocol { url: url.to_string() });
    }
    let port = url.port().unwrap_or(DEFAULT_UDP_PORT);
    let address = match url.host() {
      Some(Host::Ipv4(ip)) => SocketAddr::new(IpAddr::V4(ip), port),
      Some(Host::Ipv6(ip)) => SocketAddr::new(IpAddr::V6(ip), port),
      Some(Host::Domain(domain)) if !domain.is_empty() => resolve(domain, port)?,
      _ => return Err(Error::HostNotSpecifiedInUrl { url: url.to_string() }),
    };

    let mut timeout = None;
    for (key, value) in url.query_pairs() {
      if key == "timeout" {
        let millis = value
          .parse::<u64>()
          .map_err(|_| Error::IllegalAddress { message: format!("illegal timeout: {}", value) })?;
        timeout = Some(Duration::from_millis(millis));
      }
    }
    Ok(Config { address, timeout })
  }

  /// 受信アドレスがマルチキャストグループの場合 true を返します。
  pub fn is_multicast(&self) -> bool {
    self.address.ip().is_multicast()
  }
}

impl Default for Config {
  fn default() -> Self {
    Config { address: SocketAddr::from(([224, 0, 0, 1], DEFAULT_UDP_PORT)), timeout: None }
  }
}

/// ホスト部を IP アドレスとして解釈し、できなければ名前解決して最初のアドレスを使用します。
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
  if let Ok(ip) = host.parse::<IpAddr>() {
    return Ok(SocketAddr::new(ip, port));
  }
  (host, port)
    .to_socket_addrs()?
    .next()
    .ok_or_else(|| Error::IllegalAddress { message: format!("no address for host: {}", host) })
}
