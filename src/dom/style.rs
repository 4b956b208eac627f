//! Inline `style` attribute parsing.

/// Split a declaration block into lowercase property names and trimmed values.
/// `!important` is dropped; later declarations win when looked up with [`property`].
pub(crate) fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            Some((name, value.to_string()))
        })
        .collect()
}

pub(crate) fn property(style: &str, name: &str) -> Option<String> {
    declarations(style)
        .into_iter()
        .rev()
        .find(|(property, _)| property == name)
        .map(|(_, value)| value)
}

/// Parse a CSS length in pixels (`12px`, `12`, `12.5px`), rounded down.
pub(crate) fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let parsed: f32 = number.parse().ok()?;
    if parsed.is_finite() && parsed >= 0.0 {
        Some(parsed as u32)
    } else {
        None
    }
}

pub(crate) fn parse_opacity(value: &str) -> Option<f32> {
    let value = value.trim();
    let parsed: f32 = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f32>().ok()? / 100.0,
        None => value.parse().ok()?,
    };
    parsed.is_finite().then(|| parsed.clamp(0.0, 1.0))
}
