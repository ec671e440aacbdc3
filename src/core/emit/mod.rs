//! Markup emitter: pure recursive transcription of a token tree into
//! LaTeX-flavored text.
//!
//! The indent string and the proof-mode flag travel down the call chain
//! as explicit parameters; the emitter holds no state and never mutates
//! the tree.

use crate::core::tree::{
    Arrow, Diagram, Formula, LabelPos, Matrix, StrokeStyle, Structure, Symbol, Token,
};
use crate::data::maps::{
    matrix_environment, ACCENT_COMMANDS, COMBINING_ACCENTS, PROOF_SYMBOLS, SYMBOL_TO_COMMAND,
};

/// One indentation step.
pub const INDENT_UNIT: &str = "  ";

/// Transcribe a single token into markup text.
pub fn transcribe(token: &Token, indent: &str, proof: bool) -> String {
    match token {
        Token::Symbol(sym) => transcribe_symbol(sym, indent, proof),
        Token::Number(num) => num.text.clone(),
        Token::Structure(s) => transcribe_structure(s, indent, proof),
        Token::Formula(f) => transcribe_formula(f, indent, proof),
    }
}

/// Transcribe a sequence, joining the pieces with `sep`.
fn transcribe_seq(tokens: &[Token], sep: &str, indent: &str, proof: bool) -> String {
    tokens
        .iter()
        .map(|t| transcribe(t, indent, proof))
        .collect::<Vec<_>>()
        .join(sep)
}

fn transcribe_symbol(sym: &Symbol, indent: &str, proof: bool) -> String {
    let text = sym.text.as_str();

    if proof {
        if text == "&" {
            // Line break plus one step back out.
            return format!("\\\\\n{}", dedent(indent));
        }
        if let Some(cmd) = PROOF_SYMBOLS.get(text) {
            return format!("\\{}", cmd);
        }
    }

    // A trailing combining mark unwraps to the accent command around
    // the transcription of the base.
    let chars: Vec<char> = text.chars().collect();
    if chars.len() >= 2 {
        if let Some(cmd) = COMBINING_ACCENTS.get(chars.last().unwrap()) {
            let base = Symbol {
                text: chars[..chars.len() - 1].iter().collect(),
                variable: sym.variable,
            };
            return format!("\\{}{{{}}}", cmd, transcribe_symbol(&base, indent, proof));
        }
    }

    match SYMBOL_TO_COMMAND.get(text) {
        Some(cmd) => format!("\\{}", cmd),
        None => text.to_string(),
    }
}

fn transcribe_structure(s: &Structure, indent: &str, proof: bool) -> String {
    match s {
        Structure::Frac { num, den } => format!(
            "\\frac{{{}}}{{{}}}",
            transcribe_formula(num, indent, proof),
            transcribe_formula(den, indent, proof)
        ),
        Structure::Infer {
            premise,
            conclusion,
            rule,
        } => {
            let deeper = format!("{}{}", indent, INDENT_UNIT);
            format!(
                "\\infer[{}]\n{}{{{}}}\n{}{{{}}}",
                transcribe_formula(rule, indent, proof),
                deeper,
                transcribe_formula(conclusion, &deeper, proof),
                deeper,
                transcribe_formula(premise, &deeper, proof)
            )
        }
        Structure::Power { arg } => {
            format!("^{}", braced_or_bare(transcribe_formula(arg, indent, proof)))
        }
        Structure::Index { arg } => {
            format!("_{}", braced_or_bare(transcribe_formula(arg, indent, proof)))
        }
        Structure::BigOpr { opr, lower, upper } => {
            let mut out = match SYMBOL_TO_COMMAND.get(opr.as_str()) {
                Some(cmd) => format!("\\{}", cmd),
                None => opr.clone(),
            };
            if !lower.is_empty() {
                out.push_str(&format!("_{{{}}}", transcribe_formula(lower, indent, proof)));
            }
            if !upper.is_empty() {
                out.push_str(&format!("^{{{}}}", transcribe_formula(upper, indent, proof)));
            }
            out
        }
        Structure::Accent { glyph, arg, .. } => {
            let body = transcribe_formula(arg, indent, proof);
            match ACCENT_COMMANDS.get(glyph.as_str()) {
                Some(cmd) => format!("\\{}{{{}}}", cmd, body),
                // Unknown glyph degrades to the bare argument.
                None => body,
            }
        }
        Structure::Matrix(m) => transcribe_matrix(m, "array", true, indent, proof),
        Structure::Diagram(d) => transcribe_diagram(d, indent, proof),
    }
}

fn transcribe_formula(f: &Formula, indent: &str, proof: bool) -> String {
    // Font style wraps the whole sequence; plain symbol/number runs are
    // packed without separators so \mathbf{abc} comes out as one word.
    if let Some(style_macro) = f.style.macro_name() {
        let packed = f
            .tokens
            .iter()
            .all(|t| matches!(t, Token::Symbol(_) | Token::Number(_)));
        let sep = if packed { "" } else { " " };
        return format!(
            "\\{}{{{}}}",
            style_macro,
            transcribe_seq(&f.tokens, sep, indent, proof)
        );
    }

    // A radical prefix wraps in \sqrt instead of bracket glyphs.
    if f.prefix == Some('√') {
        return format!("\\sqrt{{{}}}", transcribe_seq(&f.tokens, " ", indent, proof));
    }

    // Bracket-keyed matrix shorthand: the sole content is a matrix and
    // the pair matches one of the AMS environments.
    if let (Some(pre), Some(suf)) = (f.prefix, f.suffix) {
        if let [Token::Structure(Structure::Matrix(m))] = f.tokens.as_slice() {
            if let Some(env) = matrix_environment(pre, suf) {
                return transcribe_matrix(m, env, false, indent, proof);
            }
        }
    }

    let inner = transcribe_seq(&f.tokens, " ", indent, proof);
    match (f.prefix, f.suffix) {
        (None, None) => inner,
        (Some(pre), Some(suf)) => {
            format!("{} {} {}", bracket_glyph(pre), inner, bracket_glyph(suf))
        }
        (Some(pre), None) => format!("\\left{} {} \\right.", bracket_glyph(pre), inner),
        (None, Some(suf)) => format!("\\left. {} \\right{}", inner, bracket_glyph(suf)),
    }
}

/// A bracket glyph as markup, translated through the symbol table.
fn bracket_glyph(glyph: char) -> String {
    let mut buf = [0u8; 4];
    let text: &str = glyph.encode_utf8(&mut buf);
    match SYMBOL_TO_COMMAND.get(text) {
        Some(cmd) => format!("\\{}", cmd),
        None => text.to_string(),
    }
}

/// Wrap in braces unless the transcription is a single character.
fn braced_or_bare(s: String) -> String {
    if s.chars().count() == 1 {
        s
    } else {
        format!("{{{}}}", s)
    }
}

/// Remove one indentation step.
fn dedent(indent: &str) -> &str {
    indent.strip_suffix(INDENT_UNIT).unwrap_or("")
}

fn transcribe_matrix(
    m: &Matrix,
    env: &str,
    with_colspec: bool,
    indent: &str,
    proof: bool,
) -> String {
    let deeper = format!("{}{}", indent, INDENT_UNIT);
    let rows: Vec<Vec<String>> = (0..m.rows())
        .map(|i| {
            (0..m.cols())
                .map(|j| transcribe_formula(m.cell(i, j), &deeper, proof))
                .collect()
        })
        .collect();
    let colspec = if with_colspec {
        format!("{{{}}}", "c".repeat(m.cols()))
    } else {
        String::new()
    };
    layout_environment(env, &colspec, rows, m.rows(), m.cols(), indent)
}

/// Assemble an environment body from row/cell strings: cells joined by
/// the column separator, every row terminated by the row separator, one
/// row per line for anything larger than 2×2.
fn layout_environment(
    env: &str,
    head: &str,
    rows: Vec<Vec<String>>,
    nrows: usize,
    ncols: usize,
    indent: &str,
) -> String {
    let inline = nrows <= 2 && ncols <= 2;
    let deeper = format!("{}{}", indent, INDENT_UNIT);
    let mut out = format!("\\begin{{{}}}{}", env, head);
    if inline {
        for row in rows {
            out.push_str(&format!(" {} \\\\", row.join(" & ")));
        }
        out.push_str(&format!(" \\end{{{}}}", env));
    } else {
        for row in rows {
            out.push_str(&format!("\n{}{} \\\\", deeper, row.join(" & ")));
        }
        out.push_str(&format!("\n{}\\end{{{}}}", indent, env));
    }
    out
}

fn transcribe_diagram(d: &Diagram, indent: &str, proof: bool) -> String {
    let deeper = format!("{}{}", indent, INDENT_UNIT);
    let rows: Vec<Vec<String>> = (0..d.rows())
        .map(|i| {
            (0..d.cols())
                .map(|j| diagram_cell(d, i, j, &deeper, proof))
                .collect()
        })
        .collect();
    layout_environment("xymatrix", "", rows, d.rows(), d.cols(), indent)
}

/// One diagram cell: decoration annotation, cell content, then every
/// arrow whose origin is this cell.
fn diagram_cell(d: &Diagram, row: usize, col: usize, indent: &str, proof: bool) -> String {
    let body = transcribe_formula(d.matrix().cell(row, col), indent, proof);
    let mut out = match d.decoration(row, col) {
        Some(deco) => {
            let mut ann = String::from("*");
            if deco.size > 0 {
                ann.push_str(&"+".repeat(deco.size as usize));
            } else if deco.size < 0 {
                ann.push_str(&"-".repeat(-deco.size as usize));
            }
            if deco.circular {
                ann.push_str("[o]");
            }
            ann.push_str(&format!("[F{}]", frame_suffix(deco.doubled, deco.stroke)));
            format!("{}{{{}}}", ann, body)
        }
        None => body,
    };

    let origin = d.matrix().index(row, col);
    let outgoing: Vec<&Arrow> = d.arrows().iter().filter(|a| a.from == origin).collect();
    // Group by destination so parallel arrows fan out symmetrically.
    let mut groups: Vec<(usize, Vec<&Arrow>)> = Vec::new();
    for arrow in outgoing {
        match groups.iter_mut().find(|(to, _)| *to == arrow.to) {
            Some((_, group)) => group.push(arrow),
            None => groups.push((arrow.to, vec![arrow])),
        }
    }
    for (_, group) in &groups {
        let n = group.len();
        for (i, &arrow) in group.iter().enumerate() {
            let offset = i as f64 - (n as f64 - 1.0) / 2.0;
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&arrow_markup(d, arrow, n, offset, indent, proof));
        }
    }
    out
}

fn frame_suffix(doubled: bool, stroke: StrokeStyle) -> &'static str {
    if doubled {
        "="
    } else {
        match stroke {
            StrokeStyle::Solid => "",
            StrokeStyle::Dashed => "--",
            StrokeStyle::Dotted => ".",
        }
    }
}

fn arrow_markup(
    d: &Diagram,
    arrow: &Arrow,
    group_size: usize,
    offset: f64,
    indent: &str,
    proof: bool,
) -> String {
    let mut out = String::from("\\ar");

    // Stroke style and multiplicity jointly select the style token; the
    // default single solid '>' arrow needs no modifier.
    let line = match arrow.stroke {
        StrokeStyle::Solid => "-",
        StrokeStyle::Dashed => "--",
        StrokeStyle::Dotted => "..",
    };
    if arrow.multiplicity >= 3 {
        out.push_str(&format!("@{}{{{}{}}}", arrow.multiplicity, line, arrow.head));
    } else if arrow.multiplicity == 2 {
        out.push_str(&format!("@{{={}}}", arrow.head));
    } else if arrow.stroke != StrokeStyle::Solid || arrow.head != ">" {
        out.push_str(&format!("@{{{}{}}}", line, arrow.head));
    }

    if group_size > 1 {
        out.push_str(&format!("@<{}ex>", offset));
    }

    let (fr, fc) = d.matrix().position(arrow.from);
    let (tr, tc) = d.matrix().position(arrow.to);
    let mut dir = String::new();
    if tc >= fc {
        dir.push_str(&"r".repeat(tc - fc));
    } else {
        dir.push_str(&"l".repeat(fc - tc));
    }
    if tr >= fr {
        dir.push_str(&"d".repeat(tr - fr));
    } else {
        dir.push_str(&"u".repeat(fr - tr));
    }
    out.push_str(&format!("[{}]", dir));

    if let Some(label) = &arrow.label {
        if !label.is_empty() {
            let marker = match arrow.label_pos {
                LabelPos::Above => '^',
                LabelPos::Below => '_',
                LabelPos::Centered => '|',
            };
            out.push(marker);
            out.push_str(&format!("{{{}}}", transcribe_formula(label, indent, proof)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Decoration;

    fn sym(s: &str) -> Token {
        Token::symbol(s)
    }

    fn var(s: &str) -> Token {
        Token::variable(s)
    }

    #[test]
    fn test_symbol_table_and_passthrough() {
        assert_eq!(transcribe(&sym("α"), "", false), "\\alpha");
        assert_eq!(transcribe(&sym("≤"), "", false), "\\le");
        assert_eq!(transcribe(&sym("?"), "", false), "?");
    }

    #[test]
    fn test_combining_accent_unwraps() {
        let hat_x = Token::symbol("x\u{0302}");
        assert_eq!(transcribe(&hat_x, "", false), "\\hat{x}");
    }

    #[test]
    fn test_proof_mode_specials() {
        assert_eq!(transcribe(&sym("∧"), "", true), "\\land");
        assert_eq!(transcribe(&sym("∧"), "", false), "\\wedge");
        assert_eq!(transcribe(&sym("&"), "    ", true), "\\\\\n  ");
    }

    #[test]
    fn test_frac() {
        let mut s = Structure::frac();
        if let Structure::Frac { num, den } = &mut s {
            num.insert(0, Token::number("1"));
            den.insert(0, Token::number("2"));
        }
        assert_eq!(transcribe(&Token::Structure(s), "", false), "\\frac{1}{2}");
    }

    #[test]
    fn test_power_brace_elision() {
        let mut s = Structure::power();
        if let Structure::Power { arg } = &mut s {
            arg.insert(0, Token::number("2"));
        }
        assert_eq!(transcribe(&Token::Structure(s), "", false), "^2");

        let mut s = Structure::power();
        if let Structure::Power { arg } = &mut s {
            arg.insert(0, Token::number("10"));
        }
        assert_eq!(transcribe(&Token::Structure(s), "", false), "^{10}");
    }

    #[test]
    fn test_big_operator_bounds() {
        let mut s = Structure::big_opr("∑");
        if let Structure::BigOpr { lower, upper, .. } = &mut s {
            lower.insert(0, var("i"));
            upper.insert(0, var("n"));
        }
        assert_eq!(
            transcribe(&Token::Structure(s), "", false),
            "\\sum_{i}^{n}"
        );
    }

    #[test]
    fn test_font_style_packs_plain_runs() {
        let mut f = Formula::with_tokens(vec![var("a"), var("b"), var("c")]);
        f.style = crate::core::tree::FontStyle::Bold;
        assert_eq!(
            transcribe(&Token::Formula(f), "", false),
            "\\mathbf{abc}"
        );
    }

    #[test]
    fn test_radical_prefix() {
        let mut f = Formula::with_tokens(vec![var("x")]);
        f.set_brackets('√');
        assert_eq!(transcribe(&Token::Formula(f), "", false), "\\sqrt{x}");
    }

    #[test]
    fn test_one_sided_bracket() {
        let mut f = Formula::with_tokens(vec![var("x")]);
        f.prefix = Some('⌊');
        assert_eq!(
            transcribe(&Token::Formula(f), "", false),
            "\\left\\lfloor x \\right."
        );
    }

    #[test]
    fn test_matrix_shorthand_environment() {
        let mut m = Matrix::new(2, 2);
        for (k, cell) in m.cells_mut().iter_mut().enumerate() {
            cell.insert(0, Token::number(format!("{}", k)));
        }
        let mut f = Formula::with_tokens(vec![Token::Structure(Structure::Matrix(m))]);
        f.set_brackets('(');
        assert_eq!(
            transcribe(&Token::Formula(f), "", false),
            "\\begin{pmatrix} 0 & 1 \\\\ 2 & 3 \\\\ \\end{pmatrix}"
        );
    }

    #[test]
    fn test_generic_array_multiline() {
        let m = Matrix::new(3, 3);
        let out = transcribe(&Token::Structure(Structure::Matrix(m)), "", false);
        assert!(out.starts_with("\\begin{array}{ccc}\n"));
        assert!(out.ends_with("\n\\end{array}"));
    }

    #[test]
    fn test_diagram_arrow_fanout() {
        let mut d = Diagram::new(1, 2);
        assert!(d.add_arrow(Arrow::new(0, 1)));
        assert!(d.add_arrow(Arrow::new(0, 1)));
        let out = transcribe(&Token::Structure(Structure::Diagram(d)), "", false);
        assert!(out.contains("\\ar@<-0.5ex>[r]"));
        assert!(out.contains("\\ar@<0.5ex>[r]"));
    }

    #[test]
    fn test_diagram_styles_and_labels() {
        let mut d = Diagram::new(2, 2);
        let mut a = Arrow::new(0, 3);
        a.multiplicity = 2;
        a.label = Some(Formula::with_tokens(vec![var("f")]));
        a.label_pos = LabelPos::Below;
        assert!(d.add_arrow(a));
        d.set_decoration(0, 0, Some(Decoration {
            size: 1,
            circular: true,
            doubled: false,
            stroke: StrokeStyle::Solid,
        }));
        let out = transcribe(&Token::Structure(Structure::Diagram(d)), "", false);
        assert!(out.contains("*+[o][F]{"));
        assert!(out.contains("\\ar@{=>}[rd]_{f}"));
    }
}
