//! 키워드 매처
//!
//! 불일치 시 처음부터 다시 찾는 단순 접두사 매칭. KMP처럼 겹친 접미사를
//! 이어받지 않으며, 불일치를 일으킨 문자도 다시 검사하지 않는다.
//! 예: `"writer_readwriter_ready"` 에서는 `"writer_ready"` 를 찾지 못한다.

/// 단일 키워드 매칭 상태
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: Vec<u8>,
    /// 현재까지 일치한 접두사 길이 (항상 `< keyword.len()`)
    matched: usize,
}

impl KeywordMatcher {
    /// 새 매처 생성. 빈 키워드는 어떤 입력에도 일치하지 않는다.
    pub fn new(keyword: impl Into<Vec<u8>>) -> Self {
        Self {
            keyword: keyword.into(),
            matched: 0,
        }
    }

    /// 문자 하나 입력. 키워드 전체가 일치하면 true
    pub fn feed(&mut self, c: u8) -> bool {
        match self.keyword.get(self.matched) {
            Some(&expected) if expected == c => {
                if self.matched + 1 == self.keyword.len() {
                    self.matched = 0;
                    true
                } else {
                    self.matched += 1;
                    false
                }
            }
            _ => {
                self.matched = 0;
                false
            }
        }
    }

    /// 현재 일치한 접두사 길이
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// 찾는 키워드
    pub fn keyword(&self) -> &[u8] {
        &self.keyword
    }

    /// 매칭 상태 초기화
    pub fn reset(&mut self) {
        self.matched = 0;
    }
}
