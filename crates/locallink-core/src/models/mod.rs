//! 도메인 모델.
//!
//! 감지 결과와 폴링 상태를 표현하는 값 타입.

pub mod local_info;
pub mod poll_state;
