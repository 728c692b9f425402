// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use ::config::{Config, File};

mod controller;
pub mod error;

pub use controller::{Controller, DEFAULT_LOG_LEVEL};
pub use error::ConfigError;

/// Loads and validates the controller configuration. The format follows the file extension.
pub fn load(path: &Path) -> Result<Controller, ConfigError> {
    let controller = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize::<Controller>()?;
    controller.validate()?;
    Ok(controller)
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, time::Duration};

    use tracing::Level;

    use super::*;
    use crate::effects::EffectKind;

    fn load_yaml(yaml: &str) -> Result<Controller, ConfigError> {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let path = dir.path().join("stripctl.yaml");
        fs::write(&path, yaml).expect("unable to write config");
        load(&path)
    }

    #[test]
    fn test_load_full() -> Result<(), Box<dyn Error>> {
        let controller = load_yaml(
            "port: /dev/ttyUSB0\nbaud_rate: 9600\ntimeout: 500ms\nleds: 60\nbrightness: 100\ntick_interval: 50ms\nack_timeout: 3s\npoll_interval: 2ms\nlog_level: debug\nlog_file: stripctl.log\neffect: rainbow\n",
        )?;

        assert_eq!("/dev/ttyUSB0", controller.port());
        assert_eq!(9600, controller.baud_rate());
        assert_eq!(Duration::from_millis(500), controller.timeout()?);
        assert_eq!(60, controller.leds());
        assert_eq!(100, controller.brightness());
        assert_eq!(Duration::from_millis(50), controller.tick_interval()?);
        assert_eq!(Some(Duration::from_secs(3)), controller.ack_timeout()?);
        assert_eq!(Duration::from_millis(2), controller.poll_interval()?);
        assert_eq!(Level::DEBUG, controller.log_level()?);
        assert_eq!(Some("stripctl.log"), controller.log_file());
        assert_eq!(EffectKind::Rainbow, controller.effect()?);
        Ok(())
    }

    #[test]
    fn test_load_defaults() -> Result<(), Box<dyn Error>> {
        let controller = load_yaml("port: mock\nleds: 30\n")?;

        assert_eq!(115_200, controller.baud_rate());
        assert_eq!(Duration::from_secs(1), controller.timeout()?);
        assert_eq!(255, controller.brightness());
        assert_eq!(Duration::from_millis(75), controller.tick_interval()?);
        assert_eq!(Some(Duration::from_secs(2)), controller.ack_timeout()?);
        assert_eq!(Level::INFO, controller.log_level()?);
        assert_eq!(None, controller.log_file());
        assert_eq!(EffectKind::Off, controller.effect()?);
        Ok(())
    }

    #[test]
    fn test_no_ack_timeout() -> Result<(), Box<dyn Error>> {
        let controller = load_yaml("port: mock\nleds: 30\nack_timeout: none\n")?;
        assert_eq!(None, controller.ack_timeout()?);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load(Path::new("/nonexistent/stripctl.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_missing_required_values() {
        assert!(matches!(load_yaml("port: mock\n"), Err(ConfigError::Load(_))));
        assert!(matches!(load_yaml("leds: 10\n"), Err(ConfigError::Load(_))));
        // The LED count is addressed with one byte.
        assert!(matches!(
            load_yaml("port: mock\nleds: 300\n"),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_yaml("port: mock\nleds: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load_yaml("port: mock\nleds: 10\nbaud_rate: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load_yaml("port: mock\nleds: 10\ntick_interval: soon\n"),
            Err(ConfigError::Duration { key: "tick_interval", .. })
        ));
        assert!(matches!(
            load_yaml("port: mock\nleds: 10\nlog_level: loud\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load_yaml("port: mock\nleds: 10\neffect: strobe\n"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
