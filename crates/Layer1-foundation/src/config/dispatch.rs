//! Dispatch Config - 디스패치 설정
//!
//! 인스턴스 목록, 선택 전략, 재시도 정책을 하나의 파일로 관리.
//! 확장자에 따라 TOML 또는 JSON으로 읽는다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 기본 최대 시도 횟수
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 기본 호출 타임아웃 (밀리초)
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

// ============================================================================
// Dispatch Config
// ============================================================================

/// Dispatch 통합 설정
///
/// ```toml
/// instances = ["10.0.0.1:7000", "10.0.0.2:7000"]
///
/// [strategy]
/// kind = "random"
/// seed = 42
///
/// [retry]
/// max_attempts = 3
/// timeout_ms = 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 백엔드 인스턴스 식별자 (순서 유지)
    #[serde(default)]
    pub instances: Vec<String>,

    /// 엔드포인트 선택 전략
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// 재시도 정책
    #[serde(default)]
    pub retry: RetrySettings,
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 파일에서 로드 (`.json`이면 JSON, 그 외에는 TOML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            instances = config.instances.len(),
            "Loaded dispatch config"
        );
        Ok(config)
    }

    /// 파일이 없으면 None
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 다른 설정을 덮어쓰기 (기본값이 아닌 항목만)
    pub fn merge(&mut self, other: DispatchConfig) {
        if !other.instances.is_empty() {
            self.instances = other.instances;
        }
        if other.strategy != StrategyConfig::default() {
            self.strategy = other.strategy;
        }
        self.retry.merge(other.retry);
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        if self.retry.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be at least 1".to_string()));
        }
        if let Some(empty) = self.instances.iter().position(|i| i.trim().is_empty()) {
            return Err(Error::Config(format!("instance #{} is empty", empty)));
        }
        Ok(())
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn instances<I, S>(mut self, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances = instances.into_iter().map(Into::into).collect();
        self
    }

    pub fn strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.retry.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// 엔드포인트 선택 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// 순차 순환 선택
    #[default]
    RoundRobin,
    /// 균등 무작위 선택 (seed가 없으면 엔트로피 사용)
    Random {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::RoundRobin => "round_robin",
            StrategyConfig::Random { .. } => "random",
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

/// 재시도 정책: 시도 횟수 + 전체 데드라인
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// 최대 시도 횟수 (첫 시도 포함)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 논리 호출 하나에 주어지는 전체 시간 (밀리초)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl RetrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn merge(&mut self, other: RetrySettings) {
        if other.max_attempts != DEFAULT_MAX_ATTEMPTS {
            self.max_attempts = other.max_attempts;
        }
        if other.timeout_ms != DEFAULT_TIMEOUT_MS {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
