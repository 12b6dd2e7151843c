use super::styled::Tone;

/// The 16 personalities the service knows about, in its canonical order.
#[cfg(test)]
pub const KNOWN_PERSONALITIES: [&str; 16] = [
    "ISTJ", "ISFJ", "INFJ", "INTJ", "ISTP", "ISFP", "INFP", "INTP", "ESTP", "ESFP", "ENFP", "ENTP",
    "ESTJ", "ESFJ", "ENFJ", "ENTJ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalityStyle {
    pub icon: &'static str,
    pub tone: Tone,
}

pub const FALLBACK_STYLE: PersonalityStyle = PersonalityStyle {
    icon: "🤖",
    tone: Tone::Gray,
};

/// Card style for a known personality id. Case-sensitive.
pub fn known_style(personality_id: &str) -> Option<PersonalityStyle> {
    let (icon, tone) = match personality_id {
        "ISTJ" => ("📘", Tone::Blue),
        "ISFJ" => ("🛡️", Tone::Cyan),
        "INFJ" => ("🔮", Tone::Indigo),
        "INTJ" => ("♟️", Tone::Purple),
        "ISTP" => ("🛠️", Tone::Green),
        "ISFP" => ("🎨", Tone::Emerald),
        "INFP" => ("💭", Tone::Pink),
        "INTP" => ("🔬", Tone::Teal),
        "ESTP" => ("⚡", Tone::Yellow),
        "ESFP" => ("🎭", Tone::Orange),
        "ENFP" => ("🌈", Tone::Rose),
        "ENTP" => ("🌀", Tone::Red),
        "ESTJ" => ("📊", Tone::Lime),
        "ESFJ" => ("🤝", Tone::Amber),
        "ENFJ" => ("🌟", Tone::Fuchsia),
        "ENTJ" => ("🚀", Tone::Sky),
        _ => return None,
    };
    Some(PersonalityStyle { icon, tone })
}
