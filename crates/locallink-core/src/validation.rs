//! 커스텀 포트 입력 검증.
//!
//! 사용자가 입력한 문자열을 포트 번호로 해석하고 범위/중복 규칙을 검사한다.
//! 순수 함수: 같은 입력에 항상 같은 결과.

use thiserror::Error;

/// 허용 포트 최솟값
pub const MIN_PORT: i64 = 1;

/// 허용 포트 최댓값
pub const MAX_PORT: i64 = 65_535;

/// 포트 입력 검증 실패
///
/// `Display` 문자열이 곧 화면에 표시되는 메시지다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 정수가 아니거나 1–65535 범위 밖
    #[error("Enter a valid port (1–65535).")]
    InvalidFormat,
    /// 이미 추가된 포트
    #[error("Port already added.")]
    Duplicate,
}

/// 포트 문자열 검증 후 포트 번호 반환
///
/// 앞쪽 공백과 부호 하나를 건너뛴 뒤 이어지는 10진 숫자만 읽는다.
/// 숫자 뒤의 나머지(`"8080abc"`, `"3000.5"`)는 무시한다.
pub fn parse_port(raw: &str, existing: &[u16]) -> Result<u16, ValidationError> {
    let value = leading_integer(raw).ok_or(ValidationError::InvalidFormat)?;

    if !(MIN_PORT..=MAX_PORT).contains(&value) {
        return Err(ValidationError::InvalidFormat);
    }

    let port = u16::try_from(value).map_err(|_| ValidationError::InvalidFormat)?;
    if existing.contains(&port) {
        return Err(ValidationError::Duplicate);
    }

    Ok(port)
}

/// 문자열 앞부분의 10진 정수 (숫자가 하나도 없으면 None)
///
/// 자릿수가 넘쳐도 포화시킨다. 범위 검사에서 걸러진다.
fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }

    let magnitude = rest.as_bytes()[..len].iter().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// 포트 문자열 검증 (None이면 유효)
pub fn validate_port(raw: &str, existing: &[u16]) -> Option<ValidationError> {
    parse_port(raw, existing).err()
}

/// 이미 파싱된 포트 번호 검증
pub fn check_port(port: u16, existing: &[u16]) -> Result<u16, ValidationError> {
    if port == 0 {
        return Err(ValidationError::InvalidFormat);
    }
    if existing.contains(&port) {
        return Err(ValidationError::Duplicate);
    }
    Ok(port)
}
