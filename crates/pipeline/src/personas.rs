//! Persona definitions.
//!
//! A persona is a fixed system instruction plus a name. All personas share one
//! invocation path (`nodes::PersonaAgent::invoke`); the only thing that varies
//! between them is the data held here.

use std::collections::BTreeMap;

use crate::{AtelierError, PersonaName};

// ---------------------------------------------------------------------------
// Built-in persona names
// ---------------------------------------------------------------------------

/// Exhibition planner: topic → title and description.
pub const PLANNER: &str = "Planner";
/// Art critic: plan → critique, or the pass token.
pub const CRITIC: &str = "Critic";
/// Prompt engineer: plan → English image prompt.
pub const PROMPT_MAKER: &str = "PromptMaker";
/// Translator: text → text in the bound target language.
pub const TRANSLATOR: &str = "Translator";
/// Docent: artwork name → narrated explanation.
pub const DOCENT: &str = "Docent";
/// Community manager: topic and plan → announcement.
pub const COMMUNITY_MANAGER: &str = "CommunityManager";
/// Collection curator: visitor query → exhibition information.
pub const CURATOR: &str = "Curator";
/// DAO secretary: long discussion → three-line summary.
pub const AGENDA_MANAGER: &str = "AgendaManager";
/// Support desk: complaint → apology and remedy.
pub const SUPPORT: &str = "Support";
/// Studio painter: topic → three-sentence English prompt in the bound style.
pub const STYLED_PROMPT_MAKER: &str = "StyledPromptMaker";

/// Literal Critic answer meaning "no changes requested". Never checked by the
/// executor.
pub const CRITIC_PASS_TOKEN: &str = "통과";

/// Placeholder in the Translator role text.
pub const TARGET_LANGUAGE_SLOT: &str = "target_language";

/// Placeholder in the StyledPromptMaker role text.
pub const STYLE_SLOT: &str = "style";

const PLANNER_ROLE: &str = "너는 창의적인 미술관 전시기획자야.
주제가 주어지면 사람들의 이목을 끌 수 있는 전시 작품의 '제목'과 '상세 묘사'를 기획해야 해.
결과는 반드시 다음 형식으로 줘:
- 제목:
- 작품 설명:";

const CRITIC_ROLE: &str = "너는 까칠한 미술 평론가야.
기획안을 보고 너무 추상적이거나 표현하기 힘든 부분이 있다면 지적해줘.
수정이 필요 없다면 '통과'라고 말해줘.";

const PROMPT_MAKER_ROLE: &str = "너는 AI 화가에게 그림을 그리라고 명령하는 '프롬프트 엔지니어'야.
확정된 기획안을 보고, DALL-E나 Stable Diffusion이 이해할 수 있는 영어 프롬프트로 변환해줘.
사족 없이 오직 영어 프롬프트 문장만 출력해.";

const TRANSLATOR_ROLE: &str = "너는 미술관의 전문 번역가야.
주어지는 기획안이나 작품 설명을 '{target_language}'로 번역해줘.
미술 전문 용어의 뉘앙스를 잘 살려서 번역해야 해.

[중요]
- \"Here is the translation\" 같은 사족이나 잡담은 절대 하지 마.
- 오직 번역된 결과 텍스트만 출력해.";

const DOCENT_ROLE: &str = "너는 미술관의 친절하고 박식한 '도슨트(해설가)'야.
관람객이 작품 이름을 물어보면, 그 작품의 예술적 가치, 작가의 의도, 감상 포인트를
아주 쉽고 재미있게 설명해줘. (없는 작품이면 지어내서라도 설명해)";

const COMMUNITY_MANAGER_ROLE: &str = "너는 우리 미술관 DAO의 열정적인 '커뮤니티 매니저'야.
새로운 전시 기획이 확정되고 그림까지 완성되었다는 기쁜 소식을
DAO 멤버들(디스코드, 트위터)에게 알리는 '공지사항'을 작성해줘.

이모지(🎨, 🔥, 📢)를 적절히 사용해서 사람들의 기대감을 높이고,
꼭 와서 거버넌스 토큰으로 투표해달라고 독려해야 해.";

const CURATOR_ROLE: &str = "너는 미술관의 소장품을 관리하는 큐레이터야.
지금 우리 미술관은 '사이버펑크 서울', '고흐의 재림', 'AI가 그린 미래'
이렇게 3가지 테마의 전시를 진행 중이라고 가정해.
관람객이 전시 일정이나 보유 작품을 물어보면 이 정보를 바탕으로 안내해줘.";

const AGENDA_MANAGER_ROLE: &str = "너는 DAO의 안건을 관리하는 서기야.
사용자가 긴 글이나 복잡한 토론 내용을 입력하면,
핵심 내용만 뽑아서 '3줄 요약'으로 깔끔하게 정리해줘.
반드시 마크다운 형식(- )을 써서 요약해.";

const SUPPORT_ROLE: &str = "너는 미술관의 고객지원 센터장이야.
관람객의 불만이나 문의사항이 들어오면,
최대한 정중하게 공감해주고 해결 방안(예: 포인트 지급, 담당자 호출 등)을 제시해줘.";

const STYLED_PROMPT_MAKER_ROLE: &str = "너는 창의적인 AI 화가야.
사용자가 주어진 주제를 '{style}' 화풍으로 그려달라고 했어.
이 그림을 그리기 위한 상세하고 묘사적인 영어 프롬프트를 3문장으로 작성해줘.
(다른 말 없이 오직 영어 텍스트만 출력해)";

/// Formats the CommunityManager input from the topic and the plan.
pub fn community_brief(topic: &str, plan: &str) -> String {
    format!("주제: {topic}\n\n기획안 요약: {plan}")
}

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// A named, fixed system instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Catalog key and log label.
    pub name: PersonaName,
    /// System instruction sent with every call. May contain `{slot}` markers.
    pub role_text: String,
}

impl Persona {
    /// Creates a persona from a name and role text.
    pub fn new(name: PersonaName, role_text: impl Into<String>) -> Self {
        Self {
            name,
            role_text: role_text.into(),
        }
    }

    /// Returns a copy with every `{slot}` in the role text replaced by `value`.
    pub fn bind(&self, slot: &str, value: &str) -> Self {
        Self {
            name: self.name.clone(),
            role_text: self.role_text.replace(&format!("{{{slot}}}"), value),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Mapping from persona name to persona, built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct PersonaCatalog {
    personas: BTreeMap<PersonaName, Persona>,
}

impl PersonaCatalog {
    /// Catalog holding the ten built-in personas.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (name, role) in [
            (PLANNER, PLANNER_ROLE),
            (CRITIC, CRITIC_ROLE),
            (PROMPT_MAKER, PROMPT_MAKER_ROLE),
            (TRANSLATOR, TRANSLATOR_ROLE),
            (DOCENT, DOCENT_ROLE),
            (COMMUNITY_MANAGER, COMMUNITY_MANAGER_ROLE),
            (CURATOR, CURATOR_ROLE),
            (AGENDA_MANAGER, AGENDA_MANAGER_ROLE),
            (SUPPORT, SUPPORT_ROLE),
            (STYLED_PROMPT_MAKER, STYLED_PROMPT_MAKER_ROLE),
        ] {
            if let Some(name) = PersonaName::new(name) {
                catalog.insert(Persona::new(name, role));
            }
        }
        catalog
    }

    /// Adds a persona, replacing any existing persona with the same name.
    pub fn insert(&mut self, persona: Persona) {
        self.personas.insert(persona.name.clone(), persona);
    }

    /// Looks a persona up by name.
    pub fn get(&self, name: &str) -> Option<&Persona> {
        PersonaName::new(name).and_then(|key| self.personas.get(&key))
    }

    /// Like [`Self::get`] but reports a missing persona as an error.
    pub fn require(&self, name: &str) -> Result<&Persona, AtelierError> {
        self.get(name).ok_or_else(|| AtelierError::UnknownPersona {
            name: name.to_string(),
        })
    }

    /// Persona names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &PersonaName> {
        self.personas.keys()
    }

    /// Applies role-text overrides from a JSON object of `name -> role_text`.
    ///
    /// Unknown names are added; known names are replaced.
    pub fn apply_overrides_json(&mut self, json: &str) -> Result<(), AtelierError> {
        let overrides: BTreeMap<PersonaName, String> =
            serde_json::from_str(json).map_err(|e| AtelierError::ConfigurationError {
                message: format!("invalid persona overrides: {e}"),
            })?;
        for (name, role_text) in overrides {
            tracing::debug!(persona = %name, "overriding persona role text");
            self.insert(Persona::new(name, role_text));
        }
        Ok(())
    }
}
