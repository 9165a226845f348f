use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use mio::net::UdpSocket;
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::bridge::Config;
use crate::msg::codec::decode;
use crate::msg::{Packet, MAX_MESSAGE_SIZE};
use crate::Result;


const SOCKET: Token = Token(0);

/// 相手アプリケーションとデータグラムを送受信するための UDP エンドポイントです。
///
/// ノンブロッキングのソケットを `Poll` に登録し、設定された待機時間だけ受信を待ちます。
pub struct UdpServer {
  socket: UdpSocket,
  poll: Poll,
  events: Events,
  timeout: Option<Duration>,
  /// 最大長を超えるデータグラムを検出できるよう 1 バイト大きく確保した受信バッファ。
  buffer: Box<[u8]>,
}

impl UdpServer {
  /// 設定されたアドレスでソケットをバインドします。マルチキャストグループが指定された場合はワイルドカード
  /// アドレスにバインドし、カーネルが選択した既定のインターフェースでグループに参加します。
  ///
  /// 同じポートを他の受信者と共有できるよう、バインド前にアドレスの再利用を有効にします。
  pub fn bind(config: &Config) -> Result<UdpServer> {
    let port = config.address.port();
    let socket = match config.address.ip() {
      IpAddr::V4(group) if group.is_multicast() => {
        let socket = reusable_socket(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))?;
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        log::info!("joined multicast group {} on port {}", group, port);
        socket
      }
      IpAddr::V6(group) if group.is_multicast() => {
        let socket = reusable_socket(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port))?;
        socket.join_multicast_v6(&group, 0)?;
        log::info!("joined multicast group {} on port {}", group, port);
        socket
      }
      IpAddr::V4(_) => {
        let socket = reusable_socket(config.address)?;
        socket.set_broadcast(true)?;
        socket
      }
      IpAddr::V6(_) => reusable_socket(config.address)?,
    };
    let mut socket = UdpSocket::from_std(socket.into());

    let poll = Poll::new()?;
    poll.registry().register(&mut socket, SOCKET, Interest::READABLE)?;
    log::info!("UDP bridge listening on {}", socket.local_addr()?);
    Ok(UdpServer {
      socket,
      poll,
      events: Events::with_capacity(16),
      timeout: config.timeout,
      buffer: vec![0u8; MAX_MESSAGE_SIZE + 1].into_boxed_slice(),
    })
  }

  /// このソケットがバインドしているアドレスを参照します。
  pub fn local_address(&self) -> Result<SocketAddr> {
    self.socket.local_addr().map_err(From::from)
  }

  /// データグラムを 1 つ受信します。待機時間内に到着しなかった場合は `None` を返します。
  pub fn receive(&mut self) -> Result<Option<(SocketAddr, Vec<u8>)>> {
    loop {
      match self.socket.recv_from(&mut self.buffer) {
        Ok((length, source)) => return Ok(Some((source, self.buffer[..length].to_vec()))),
        Err(err) if err.kind() == ErrorKind::WouldBlock => (),
        Err(err) if err.kind() == ErrorKind::Interrupted => continue,
        Err(err) => return Err(err.into()),
      }

      match self.poll.poll(&mut self.events, self.timeout) {
        Ok(()) => (),
        Err(err) if err.kind() == ErrorKind::Interrupted => continue,
        Err(err) => return Err(err.into()),
      }
      if self.events.is_empty() {
        log::trace!("no datagram received within {:?}", self.timeout);
        return Ok(None);
      }
    }
  }

  /// データグラムを 1 つ受信してメッセージに復元します。
  pub fn receive_packet(&mut self) -> Result<Option<Packet>> {
    Ok(self.receive()?.map(|(source, bytes)| decode(Some(source), &bytes)))
  }

  /// 指定されたアドレスへデータグラムを送信し、送信したバイト数を返します。
  pub fn send(&self, destination: SocketAddr, packet: &[u8]) -> Result<usize> {
    let length = self.socket.send_to(packet, destination)?;
    log::debug!("sent {} bytes to {}", length, destination);
    Ok(length)
  }
}

/// アドレスの再利用を有効にしたノンブロッキングの UDP ソケットを指定されたアドレスにバインドします。
fn reusable_socket(address: SocketAddr) -> Result<Socket> {
  let socket = Socket::new(Domain::for_address(address), Type::DGRAM, Some(Protocol::UDP))?;
  socket.set_reuse_address(true)?;
  #[cfg(unix)]
  socket.set_reuse_port(true)?;
  socket.set_nonblocking(true)?;
  socket.bind(&SockAddr::from(address))?;
  Ok(socket)
}
