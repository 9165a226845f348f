use std::time::Duration;

use url::Url;

use crate::bridge::{Config, DEFAULT_URL};
use crate::error::Error;

#[test]
fn test_url() {
  let url = Url::parse("udp://224.0.0.1:2237/?timeout=1200").unwrap();
  assert_eq!("udp", url.scheme());
  assert_eq!("224.0.0.1", url.host_str().unwrap());
  assert_eq!(2237u16, url.port().unwrap());
  assert_eq!("timeout=1200", url.query().unwrap());
}

#[test]
fn test_parse_config() {
  let config = Config::parse(DEFAULT_URL).unwrap();
  assert_eq!(Config::default(), config);
  assert_eq!("224.0.0.1:2237", config.address.to_string());
  assert!(config.is_multicast());
  assert_eq!(None, config.timeout);

  // ポートを省略すると既定のポートを使用する
  let config = Config::parse("udp://127.0.0.1").unwrap();
  assert_eq!("127.0.0.1:2237", config.address.to_string());
  assert!(!config.is_multicast());

  let config = Config::parse("udp://127.0.0.1:50000?timeout=1500").unwrap();
  assert_eq!(50000, config.address.port());
  assert_eq!(Some(Duration::from_millis(1500)), config.timeout);

  let config = Config::parse("udp://[::1]:2238").unwrap();
  assert_eq!("[::1]:2238", config.address.to_string());
}

#[test]
fn test_illegal_config() {
  match Config::parse("tcp://127.0.0.1:2237") {
    Err(Error::UnsupportedProtocol { url }) => assert_eq!("tcp://127.0.0.1:2237", url),
    unexpected => panic!("{:?}", unexpected),
  }
  match Config::parse("udp:/path/only") {
    Err(Error::HostNotSpecifiedInUrl { .. }) => (),
    unexpected => panic!("{:?}", unexpected),
  }
  match Config::parse("udp://127.0.0.1:2237?timeout=soon") {
    Err(Error::IllegalAddress { message }) => assert!(message.contains("soon")),
    unexpected => panic!("{:?}", unexpected),
  }
  assert!(Config::parse("not a url").is_err());
}
