use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::Error;
use crate::Result;


const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

/// 指定されたレベル以上のログを標準出力へ出力するロガーを設定します。既にロガーが設定されている場合は失敗します。
pub fn init(level: LevelFilter) -> Result<()> {
  let stdout = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();
  let config = Config::builder()
    .appender(Appender::builder().build("stdout", Box::new(stdout)))
    .build(Root::builder().appender("stdout").build(level))
    .map_err(|err| Error::Logging { message: err.to_string() })?;
  log4rs::init_config(config).map_err(|err| Error::Logging { message: err.to_string() })?;
  Ok(())
}
