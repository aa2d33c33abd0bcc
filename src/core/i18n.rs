//! Languages and localized user-facing messages.
//!
//! Every prompt sent to the generative API carries a per-language response
//! instruction, and every notice shown to the user comes from [`Message`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workshop language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Korean
    Ko,
    /// Amharic
    Am,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Self; 3] = [Self::En, Self::Ko, Self::Am];

    /// Short language code.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
            Self::Am => "am",
        }
    }

    /// Instruction appended to every generation prompt so the model answers
    /// in this language and without markdown around the JSON.
    pub fn response_instruction(self) -> &'static str {
        match self {
            Self::En => "You must respond only in English. Do not include markdown formatting for JSON.",
            Self::Ko => "응답은 반드시 한국어로만 해주세요. JSON 형식의 마크다운은 제거해주세요.",
            Self::Am => "በአማርኛ ብቻ መልስ ይስጡ. ለ JSON የማርክዳውን ቅርጸትን አታካትት።",
        }
    }

    /// Word used for "Step" in flow summaries.
    pub fn step_word(self) -> &'static str {
        match self {
            Self::En => "Step",
            Self::Ko => "단계",
            Self::Am => "ደረጃ",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ko" | "korean" => Ok(Self::Ko),
            "am" | "amharic" => Ok(Self::Am),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Localized message catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Saved,
    SaveFailed,
    ProfileUpdated,
    ProfileUpdateFailed,
    NotSignedIn,
    NoIdeaSelected,
    NoSketchSelected,
    NoRecords,
    InvalidSelection,
    GenerationFailed,
    GenerationBlocked,
    AlreadyRunning,
    ConfirmRegenerateIdeas,
    ConfirmRegenerateSketches,
    ConfirmRegenerateStoryboards,
}

impl Message {
    /// Render the message in the given language.
    pub fn text(self, lang: Language) -> &'static str {
        use Language::{Am, En, Ko};
        match (self, lang) {
            (Self::Saved, En) => "Saved successfully",
            (Self::Saved, Ko) => "저장되었습니다",
            (Self::Saved, Am) => "ተቀምጧል",

            (Self::SaveFailed, En) => "Failed to save",
            (Self::SaveFailed, Ko) => "저장 실패",
            (Self::SaveFailed, Am) => "ማስቀመጥ አልተሳካም",

            (Self::ProfileUpdated, En) => "Profile updated",
            (Self::ProfileUpdated, Ko) => "프로필이 업데이트되었습니다",
            (Self::ProfileUpdated, Am) => "መገለጫ ተዘምኗል",

            (Self::ProfileUpdateFailed, En) => "Failed to update profile",
            (Self::ProfileUpdateFailed, Ko) => "프로필 업데이트 실패",
            (Self::ProfileUpdateFailed, Am) => "መገለጫ ማዘመን አልተሳካም",

            (Self::NotSignedIn, En) => "You must be logged in to continue.",
            (Self::NotSignedIn, Ko) => "계속하려면 로그인해야 합니다.",
            (Self::NotSignedIn, Am) => "ለመቀጠል መግባት አለብዎት።",

            (Self::NoIdeaSelected, En) => "Please select a business idea first.",
            (Self::NoIdeaSelected, Ko) => "먼저 비즈니스 아이디어를 선택해주세요.",
            (Self::NoIdeaSelected, Am) => "እባክዎ መጀመሪያ የንግድ ሀሳብ ይምረጡ።",

            (Self::NoSketchSelected, En) => "Please select a sketch first.",
            (Self::NoSketchSelected, Ko) => "먼저 스케치를 선택해주세요.",
            (Self::NoSketchSelected, Am) => "እባክዎ መጀመሪያ ንድፍ ይምረጡ።",

            (Self::NoRecords, En) => "No records provided for analysis.",
            (Self::NoRecords, Ko) => "분석할 기록이 없습니다.",
            (Self::NoRecords, Am) => "ለትንተና ምንም መዝገቦች አልቀረቡም።",

            (Self::InvalidSelection, En) => "The selected item does not exist.",
            (Self::InvalidSelection, Ko) => "선택한 항목이 존재하지 않습니다.",
            (Self::InvalidSelection, Am) => "የተመረጠው ንጥል የለም።",

            (Self::GenerationFailed, En) => "Generation failed. Please check your API key and try again.",
            (Self::GenerationFailed, Ko) => "생성에 실패했습니다. API 키를 확인하고 다시 시도해주세요.",
            (Self::GenerationFailed, Am) => "ማመንጨት አልተሳካም። የ API ቁልፍዎን ያረጋግጡ እና እንደገና ይሞክሩ።",

            (Self::GenerationBlocked, En) => "The request was blocked for safety reasons",
            (Self::GenerationBlocked, Ko) => "안전상의 이유로 요청이 차단되었습니다",
            (Self::GenerationBlocked, Am) => "ጥያቄው በደህንነት ምክንያቶች ታግዷል",

            (Self::AlreadyRunning, En) => "A generation for this step is already in progress.",
            (Self::AlreadyRunning, Ko) => "이 단계의 생성이 이미 진행 중입니다.",
            (Self::AlreadyRunning, Am) => "የዚህ ደረጃ ማመንጨት አስቀድሞ በሂደት ላይ ነው።",

            (Self::ConfirmRegenerateIdeas, En) => "Delete existing ideas and generate new ones?",
            (Self::ConfirmRegenerateIdeas, Ko) => "기존 아이디어를 삭제하고 새로 생성하시겠습니까?",
            (Self::ConfirmRegenerateIdeas, Am) => "ያሉትን ሀሳቦች መሰረዝ እና አዲስ መፍጠር ይፈልጋሉ?",

            (Self::ConfirmRegenerateSketches, En) => "Delete existing sketches and generate new ones?",
            (Self::ConfirmRegenerateSketches, Ko) => "기존 스케치를 삭제하고 새로 생성하시겠습니까?",
            (Self::ConfirmRegenerateSketches, Am) => "ያሉትን ንድፎች መሰረዝ እና አዲስ መፍጠር ይፈልጋሉ?",

            (Self::ConfirmRegenerateStoryboards, En) => {
                "Delete existing storyboards and generate new ones?"
            }
            (Self::ConfirmRegenerateStoryboards, Ko) => {
                "기존 스토리보드를 삭제하고 새로 생성하시겠습니까?"
            }
            (Self::ConfirmRegenerateStoryboards, Am) => {
                "ያሉትን የታሪክ ሰሌዳዎች መሰረዝ እና አዲስ መፍጠር ይፈልጋሉ?"
            }
        }
    }
}

/// Describe how long ago the last save happened.
///
/// Mirrors the save indicator thresholds: under 5 seconds is "just saved",
/// then seconds, minutes and hours.
pub fn describe_save_age(lang: Language, elapsed_secs: i64) -> String {
    let secs = elapsed_secs.max(0);
    if secs < 5 {
        return match lang {
            Language::En => "Just saved".to_string(),
            Language::Ko => "방금 저장됨".to_string(),
            Language::Am => "አሁን ተቀምጧል".to_string(),
        };
    }

    if secs < 60 {
        return match lang {
            Language::En => format!("{secs}s ago"),
            Language::Ko => format!("{secs}초 전"),
            Language::Am => format!("ከ{secs} ሰከንዶች በፊት"),
        };
    }

    if secs < 3600 {
        let minutes = secs / 60;
        return match lang {
            Language::En => format!("{minutes}m ago"),
            Language::Ko => format!("{minutes}분 전"),
            Language::Am => format!("ከ{minutes} ደቂቃዎች በፊት"),
        };
    }

    let hours = secs / 3600;
    match lang {
        Language::En => format!("{hours}h ago"),
        Language::Ko => format!("{hours}시간 전"),
        Language::Am => format!("ከ{hours} ሰዓቶች በፊት"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("Korean".parse::<Language>().unwrap(), Language::Ko);
        assert_eq!(" am ".parse::<Language>().unwrap(), Language::Am);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_lowercase() {
        let json = serde_json::to_string(&Language::Ko).unwrap();
        assert_eq!(json, "\"ko\"");
        let lang: Language = serde_json::from_str("\"am\"").unwrap();
        assert_eq!(lang, Language::Am);
    }

    #[test]
    fn test_every_message_is_translated() {
        let all = [
            Message::Saved,
            Message::SaveFailed,
            Message::ProfileUpdated,
            Message::ProfileUpdateFailed,
            Message::NotSignedIn,
            Message::NoIdeaSelected,
            Message::NoSketchSelected,
            Message::NoRecords,
            Message::InvalidSelection,
            Message::GenerationFailed,
            Message::GenerationBlocked,
            Message::AlreadyRunning,
            Message::ConfirmRegenerateIdeas,
            Message::ConfirmRegenerateSketches,
            Message::ConfirmRegenerateStoryboards,
        ];
        for message in all {
            for lang in Language::ALL {
                assert!(!message.text(lang).is_empty(), "{message:?} missing for {lang}");
            }
        }
    }

    #[test]
    fn test_describe_save_age_thresholds() {
        assert_eq!(describe_save_age(Language::En, 0), "Just saved");
        assert_eq!(describe_save_age(Language::En, 4), "Just saved");
        assert_eq!(describe_save_age(Language::En, 5), "5s ago");
        assert_eq!(describe_save_age(Language::En, 59), "59s ago");
        assert_eq!(describe_save_age(Language::En, 60), "1m ago");
        assert_eq!(describe_save_age(Language::En, 3599), "59m ago");
        assert_eq!(describe_save_age(Language::En, 7200), "2h ago");
        assert_eq!(describe_save_age(Language::Ko, 120), "2분 전");
    }

    #[test]
    fn test_describe_save_age_clamps_future_timestamps() {
        assert_eq!(describe_save_age(Language::En, -30), "Just saved");
    }
}
