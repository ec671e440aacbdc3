//! Static symbol and command tables.
//!
//! All tables are built at compile time and treated as immutable. The
//! symbol table is bidirectional: the forward direction (display text to
//! command name) is a perfect hash map, the reverse direction is derived
//! from it once at first use.

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use phf::phf_map;

/// Display text to LaTeX command name (without the leading backslash).
///
/// Symbols missing from this table pass through the emitter verbatim.
pub static SYMBOL_TO_COMMAND: phf::Map<&'static str, &'static str> = phf_map! {
    // Greek letters
    "α" => "alpha",
    "β" => "beta",
    "γ" => "gamma",
    "δ" => "delta",
    "ε" => "varepsilon",
    "ζ" => "zeta",
    "η" => "eta",
    "θ" => "theta",
    "ι" => "iota",
    "κ" => "kappa",
    "λ" => "lambda",
    "μ" => "mu",
    "ν" => "nu",
    "ξ" => "xi",
    "π" => "pi",
    "ρ" => "rho",
    "σ" => "sigma",
    "τ" => "tau",
    "υ" => "upsilon",
    "φ" => "varphi",
    "χ" => "chi",
    "ψ" => "psi",
    "ω" => "omega",
    "Γ" => "Gamma",
    "Δ" => "Delta",
    "Θ" => "Theta",
    "Λ" => "Lambda",
    "Ξ" => "Xi",
    "Π" => "Pi",
    "Σ" => "Sigma",
    "Υ" => "Upsilon",
    "Φ" => "Phi",
    "Ψ" => "Psi",
    "Ω" => "Omega",
    // Binary operators
    "±" => "pm",
    "∓" => "mp",
    "×" => "times",
    "÷" => "div",
    "⋅" => "cdot",
    "∘" => "circ",
    "∗" => "ast",
    "⊕" => "oplus",
    "⊖" => "ominus",
    "⊗" => "otimes",
    "⊘" => "oslash",
    // Relations
    "≤" => "le",
    "≥" => "ge",
    "≠" => "ne",
    "≈" => "approx",
    "≡" => "equiv",
    "≃" => "simeq",
    "∼" => "sim",
    "∝" => "propto",
    "≺" => "prec",
    "≻" => "succ",
    // Arrows
    "→" => "to",
    "←" => "gets",
    "↔" => "leftrightarrow",
    "⇒" => "Rightarrow",
    "⇐" => "Leftarrow",
    "⇔" => "Leftrightarrow",
    "↦" => "mapsto",
    "↪" => "hookrightarrow",
    "↑" => "uparrow",
    "↓" => "downarrow",
    // Set theory
    "∈" => "in",
    "∉" => "notin",
    "⊂" => "subset",
    "⊆" => "subseteq",
    "⊃" => "supset",
    "⊇" => "supseteq",
    "∪" => "cup",
    "∩" => "cap",
    "∖" => "setminus",
    "∅" => "emptyset",
    // Logic
    "∧" => "wedge",
    "∨" => "vee",
    "¬" => "neg",
    "∀" => "forall",
    "∃" => "exists",
    "⊢" => "vdash",
    "⊨" => "models",
    "⊥" => "bot",
    "⊤" => "top",
    // Big operators
    "∑" => "sum",
    "∏" => "prod",
    "∐" => "coprod",
    "∫" => "int",
    "∮" => "oint",
    "⋃" => "bigcup",
    "⋂" => "bigcap",
    "⨁" => "bigoplus",
    "⨂" => "bigotimes",
    // Delimiters
    "{" => "{",
    "}" => "}",
    "⟨" => "langle",
    "⟩" => "rangle",
    "⌊" => "lfloor",
    "⌋" => "rfloor",
    "⌈" => "lceil",
    "⌉" => "rceil",
    "‖" => "Vert",
    // Miscellaneous
    "∞" => "infty",
    "∂" => "partial",
    "∇" => "nabla",
    "ℏ" => "hbar",
    "ℓ" => "ell",
    "ℜ" => "Re",
    "ℑ" => "Im",
    "ℵ" => "aleph",
    "…" => "dots",
    "⋯" => "cdots",
    "⋮" => "vdots",
    "⋱" => "ddots",
    "′" => "prime",
    "°" => "degree",
    "√" => "sqrt",
};

lazy_static! {
    /// Reverse direction of [`SYMBOL_TO_COMMAND`], derived once.
    pub static ref COMMAND_TO_SYMBOL: FxHashMap<&'static str, &'static str> = {
        let mut map = FxHashMap::default();
        for (sym, cmd) in SYMBOL_TO_COMMAND.entries() {
            map.insert(*cmd, *sym);
        }
        map
    };
}

/// Proof-mode renderings that replace the plain symbol table entries.
///
/// `&` is handled separately by the emitter since it also de-indents.
pub static PROOF_SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "∧" => "land",
    "∨" => "lor",
    "¬" => "neg",
};

/// Accent glyph to accent command name.
pub static ACCENT_COMMANDS: phf::Map<&'static str, &'static str> = phf_map! {
    "^" => "hat",
    "~" => "tilde",
    "¯" => "bar",
    "˙" => "dot",
    "¨" => "ddot",
    "ˇ" => "check",
    "˘" => "breve",
    "`" => "grave",
    "´" => "acute",
    "⃗" => "vec",
    "‾" => "overline",
    "_" => "underline",
    "⏞" => "overbrace",
    "⏟" => "underbrace",
};

/// Unicode combining marks to accent command name. A symbol whose text
/// ends in one of these is emitted as the accent command wrapping the
/// base character.
pub static COMBINING_ACCENTS: phf::Map<char, &'static str> = phf_map! {
    '\u{0300}' => "grave",
    '\u{0301}' => "acute",
    '\u{0302}' => "hat",
    '\u{0303}' => "tilde",
    '\u{0304}' => "bar",
    '\u{0306}' => "breve",
    '\u{0307}' => "dot",
    '\u{0308}' => "ddot",
    '\u{030C}' => "check",
    '\u{20D7}' => "vec",
};

/// Bracket correspondence table: opening glyph to its closing partner.
///
/// `√` is a valid formula prefix but has no closing partner, so it is
/// absent here and handled by [`matching_suffix`].
pub static BRACKET_PAIRS: phf::Map<char, char> = phf_map! {
    '(' => ')',
    '[' => ']',
    '{' => '}',
    '|' => '|',
    '‖' => '‖',
    '⌊' => '⌋',
    '⌈' => '⌉',
    '⟨' => '⟩',
};

/// The closing partner of a formula prefix glyph, if it has one.
pub fn matching_suffix(prefix: char) -> Option<char> {
    BRACKET_PAIRS.get(&prefix).copied()
}

/// Bracket-keyed shorthand matrix environments, AMS style.
pub fn matrix_environment(prefix: char, suffix: char) -> Option<&'static str> {
    match (prefix, suffix) {
        ('(', ')') => Some("pmatrix"),
        ('[', ']') => Some("bmatrix"),
        ('{', '}') => Some("Bmatrix"),
        ('|', '|') => Some("vmatrix"),
        ('‖', '‖') => Some("Vmatrix"),
        _ => None,
    }
}

/// Argument obligations for known commands: `true` is a mandatory
/// argument taken by `parse_token`, `false` an optional argument only
/// consumed when introduced by `[`.
///
/// Commands absent from this table default to zero arguments.
pub static CMD_ARITY: phf::Map<&'static str, &'static [bool]> = phf_map! {
    "frac" => &[true, true],
    "dfrac" => &[true, true],
    "tfrac" => &[true, true],
    "infer" => &[false, true, true],
    "sqrt" => &[false, true],
    "newcommand" => &[true, false, true],
    "overset" => &[true, true],
    "underset" => &[true, true],
    "left" => &[true],
    "right" => &[true],
    "end" => &[true],
    // Accents
    "hat" => &[true],
    "tilde" => &[true],
    "bar" => &[true],
    "dot" => &[true],
    "ddot" => &[true],
    "check" => &[true],
    "breve" => &[true],
    "grave" => &[true],
    "acute" => &[true],
    "vec" => &[true],
    "overline" => &[true],
    "underline" => &[true],
    "overbrace" => &[true],
    "underbrace" => &[true],
    // Font styles
    "mathbf" => &[true],
    "mathit" => &[true],
    "mathbb" => &[true],
    "mathcal" => &[true],
    "mathfrak" => &[true],
    "mathsf" => &[true],
    "mathtt" => &[true],
    "mathrm" => &[true],
    "text" => &[true],
};

/// Look up a command's argument obligations, falling back to zero
/// arguments for unknown names.
pub fn static_arity(name: &str) -> &'static [bool] {
    CMD_ARITY.get(name).copied().unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(SYMBOL_TO_COMMAND.get("α"), Some(&"alpha"));
        assert_eq!(SYMBOL_TO_COMMAND.get("∑"), Some(&"sum"));
        assert_eq!(SYMBOL_TO_COMMAND.get("x"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(COMMAND_TO_SYMBOL.get("alpha"), Some(&"α"));
        assert_eq!(COMMAND_TO_SYMBOL.get("le"), Some(&"≤"));
    }

    #[test]
    fn test_bracket_pairs() {
        assert_eq!(matching_suffix('('), Some(')'));
        assert_eq!(matching_suffix('⌊'), Some('⌋'));
        assert_eq!(matching_suffix('√'), None);
    }

    #[test]
    fn test_matrix_environments() {
        assert_eq!(matrix_environment('(', ')'), Some("pmatrix"));
        assert_eq!(matrix_environment('⟨', '⟩'), None);
    }

    #[test]
    fn test_arity_defaults() {
        assert_eq!(static_arity("frac"), &[true, true]);
        assert_eq!(static_arity("infer"), &[false, true, true]);
        assert!(static_arity("unknowncmd").is_empty());
    }
}
