//! Translator from the OggDude bracket markup dialect (`[B]`, `[H3]`, `[DI]`,
//! `:boost:` ...) to the HTML rich text the VTT editor stores.
//!
//! Translation runs in three stages: a fixed list of known authoring-defect
//! corrections, a tokenizer, and a single stack-based writer that emits
//! well-formed nesting whatever the input looks like.

use once_cell::sync::Lazy;
use regex::Regex;

#[rustfmt::skip]
const DICE_TAGS: &[(&str, &str)] = &[
    ("AB", "ability"),       ("ABILITY", "ability"),
    ("DI", "difficulty"),    ("DIFFICULTY", "difficulty"),
    ("PR", "proficiency"),   ("PROFICIENCY", "proficiency"),
    ("CH", "challenge"),     ("CHALLENGE", "challenge"),
    ("BO", "boost"),         ("BOOST", "boost"),
    ("SE", "setback"),       ("SETBACK", "setback"),
    ("FO", "force"),         ("FORCE", "force"),
    ("LI", "light"),         ("LIGHTSIDE", "light"),
    ("LIGHTSIDEPOINT", "light"), ("LIGHTPOINT", "light"),
    ("DA", "dark"),          ("DARKSIDE", "dark"),
    ("DARKSIDEPOINT", "dark"), ("DARKPOINT", "dark"),
    ("SU", "success"),       ("SUCCESS", "success"),
    ("AD", "advantage"),     ("ADVANTAGE", "advantage"),
    ("FA", "failure"),       ("FAILURE", "failure"),
    ("TH", "threat"),        ("THREAT", "threat"),
    ("TR", "triumph"),       ("TRIUMPH", "triumph"),
    ("DE", "despair"),       ("DESPAIR", "despair"),
];

#[rustfmt::skip]
const COLON_DICE: &[(&str, &str)] = &[
    ("ab", "ability"),       ("ability", "ability"),
    ("di", "difficulty"),    ("difficulty", "difficulty"),
    ("pr", "proficiency"),   ("proficiency", "proficiency"),
    ("ch", "challenge"),     ("challenge", "challenge"),
    ("bo", "boost"),         ("boost", "boost"),
    ("se", "setback"),       ("setback", "setback"),
    ("fo", "force"),         ("force", "force"),
    ("lightside", "light"),  ("light", "light"),
    ("darkside", "dark"),    ("dark", "dark"),
    ("forcepip", "forcepoint"), ("forcepoint", "forcepoint"),
    ("su", "success"),       ("success", "success"),
    ("ad", "advantage"),     ("advantage", "advantage"),
    ("fa", "failure"),       ("failure", "failure"),
    ("th", "threat"),        ("threat", "threat"),
    ("tr", "triumph"),       ("triumph", "triumph"),
    ("de", "despair"),       ("despair", "despair"),
];

#[rustfmt::skip]
const COLON_DIFFICULTY: &[(&str, &str, usize)] = &[
    ("simple", "Simple", 0),
    ("easy", "Easy", 1),
    ("average", "Average", 2),
    ("hard", "Hard", 3),
    ("daunting", "Daunting", 4),
    ("formidable", "Formidable", 5),
];

/// Display words for dice tokens in plain-text fields.
#[rustfmt::skip]
const DICE_WORDS: &[(&str, &str)] = &[
    ("ability", "Ability"),         ("difficulty", "Difficulty"),
    ("proficiency", "Proficiency"), ("challenge", "Challenge"),
    ("boost", "Boost"),             ("setback", "Setback"),
    ("force", "Force"),             ("light", "Light Side"),
    ("dark", "Dark Side"),          ("success", "Success"),
    ("advantage", "Advantage"),     ("failure", "Failure"),
    ("threat", "Threat"),           ("triumph", "Triumph"),
    ("despair", "Despair"),
];

/// Literal corrections applied before tokenizing, in order.
#[rustfmt::skip]
const DEFECT_FIXES: &[(&str, &str)] = &[
    // lowercase [p] is a typo for the bold closer
    ("[p]", "[b]"),
    ("[/p]", "[/b]"),
    ("[B][P]", "[P][B]"),
    ("[/P][/B]", "[/B][/P]"),
    // "[b]:" closes the bold run before the colon
    ("[b]:", ":[b]"),
    ("[/b]:", ":[/b]"),
    ("&amp;#", "&#"),
];

static ENCODED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)&lt;(/?)([a-z][a-z0-9]*)\s*/?&gt;").expect("valid regex")
});

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        \[(?P<bclose>/?)(?P<bname>[A-Za-z][A-Za-z0-9]*)\]
        | <(?P<hclose>/?)(?P<hname>(?i:strong|b|em|i|p|ul|ol|li|br|h[1-6]?))\s*/?>
        | :(?P<colon>[a-z]+):
        | (?P<nl>\r?\n)
        ",
    )
    .expect("valid regex")
});

static DICE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\[([A-Z]+)\])+").expect("valid regex")
});

static SINGLE_DICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([A-Z]+)\]").expect("valid regex"));

pub fn dice_span(kind: &str) -> String {
    format!(
        "<span class=\"{kind}\" data-dice-type=\"{kind}\" contenteditable=\"false\" style=\"display: inline-block;\"></span>"
    )
}

fn dice_kind(tag: &str) -> Option<&'static str> {
    DICE_TAGS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, kind)| *kind)
}

fn colon_kind(word: &str) -> Option<&'static str> {
    COLON_DICE
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, kind)| *kind)
}

fn dice_word(kind: &str) -> &str {
    DICE_WORDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, word)| *word)
        .unwrap_or(kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Strong,
    Em,
    Heading(u8),
    Paragraph,
    List,
    Item,
}

impl Tag {
    fn is_inline(self) -> bool {
        matches!(self, Tag::Strong | Tag::Em)
    }

    fn open_html(self) -> String {
        match self {
            Tag::Strong => "<strong>".to_string(),
            Tag::Em => "<em>".to_string(),
            Tag::Heading(level) => format!("<h{level}>"),
            Tag::Paragraph => "<p>".to_string(),
            Tag::List => "<ul>".to_string(),
            Tag::Item => "<li>".to_string(),
        }
    }

    fn close_html(self) -> String {
        match self {
            Tag::Strong => "</strong>".to_string(),
            Tag::Em => "</em>".to_string(),
            Tag::Heading(level) => format!("</h{level}>"),
            Tag::Paragraph => "</p>".to_string(),
            Tag::List => "</ul>".to_string(),
            Tag::Item => "</li>".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Inline(String),
    Open(Tag),
    Close(Tag),
    /// Closes `Tag` when it is open in the current block, opens it otherwise.
    Toggle(Tag),
    /// `[LI]`: a list item inside a list, a light-side symbol outside one.
    ItemOrLight,
    Break,
    Newline,
}

/// Translates OggDude markup to HTML. Never fails; output is always
/// balanced.
pub fn translate(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let fixed = apply_defect_fixes(text);
    let pieces = tokenize(&fixed);
    let mut writer = Writer::default();
    for piece in pieces {
        writer.push(piece);
    }
    writer.finish()
}

fn apply_defect_fixes(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in DEFECT_FIXES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    ENCODED_TAG
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            let name = caps[2].to_ascii_lowercase();
            let name = match name.as_str() {
                "ol" => "ul",
                "h" => "h4",
                "b" | "strong" | "i" | "em" | "p" | "br" | "ul" | "li" | "h1" | "h2" | "h3"
                | "h4" | "h5" | "h6" => name.as_str(),
                _ => return caps[0].to_string(),
            };
            format!("<{}{}>", &caps[1], name)
        })
        .into_owned()
}

fn tokenize(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let piece = if let Some(name) = caps.name("bname") {
            bracket_piece(caps.name("bclose").is_some_and(|m| !m.as_str().is_empty()), name.as_str())
        } else if let Some(name) = caps.name("hname") {
            html_piece(caps.name("hclose").is_some_and(|m| !m.as_str().is_empty()), name.as_str())
        } else if let Some(word) = caps.name("colon") {
            colon_piece(word.as_str())
        } else if caps.name("nl").is_some() {
            Some(Piece::Newline)
        } else {
            None
        };
        let Some(piece) = piece else {
            continue;
        };
        if whole.start() > last {
            pieces.push(Piece::Text(&text[last..whole.start()]));
        }
        pieces.push(piece);
        last = whole.end();
    }
    if last < text.len() {
        pieces.push(Piece::Text(&text[last..]));
    }
    pieces
}

fn heading_level(name: &str) -> Option<u8> {
    let rest = name.strip_prefix(['H', 'h'])?;
    if rest.is_empty() {
        return Some(4);
    }
    rest.parse::<u8>().ok().filter(|n| (1..=6).contains(n))
}

fn bracket_piece(closing: bool, name: &str) -> Option<Piece<'static>> {
    let piece = match (closing, name) {
        (false, "B" | "b") => Piece::Toggle(Tag::Strong),
        (true, "B" | "b") => Piece::Close(Tag::Strong),
        (false, "I" | "i") => Piece::Toggle(Tag::Em),
        (true, "I" | "i") => Piece::Close(Tag::Em),
        (false, "P" | "BR" | "br") => Piece::Break,
        (true, "P") => Piece::Close(Tag::Paragraph),
        (false, "UL") => Piece::Open(Tag::List),
        (false, "ul") | (true, "UL" | "ul") => Piece::Close(Tag::List),
        (false, "LI") => Piece::ItemOrLight,
        (false, "li") | (true, "LI" | "li") => Piece::Close(Tag::Item),
        _ => {
            if let Some(level) = heading_level(name) {
                let upper = name.starts_with('H');
                return Some(if upper && !closing {
                    Piece::Open(Tag::Heading(level))
                } else {
                    Piece::Close(Tag::Heading(level))
                });
            }
            if !closing && let Some(kind) = dice_kind(name) {
                return Some(Piece::Inline(dice_span(kind)));
            }
            if name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
                let slash = if closing { "/" } else { "" };
                return Some(Piece::Inline(format!(
                    "<span class=\"oggdude-tag\">[{slash}{name}]</span>"
                )));
            }
            return None;
        }
    };
    Some(piece)
}

fn html_piece(closing: bool, name: &str) -> Option<Piece<'static>> {
    let lowered = name.to_ascii_lowercase();
    let tag = match lowered.as_str() {
        "strong" | "b" => Tag::Strong,
        "em" | "i" => Tag::Em,
        "p" => {
            return Some(if closing {
                Piece::Close(Tag::Paragraph)
            } else {
                Piece::Break
            });
        }
        "br" => return Some(Piece::Break),
        "ul" | "ol" => Tag::List,
        "li" => Tag::Item,
        other => Tag::Heading(heading_level(other)?),
    };
    Some(if closing {
        Piece::Close(tag)
    } else {
        Piece::Open(tag)
    })
}

fn colon_piece(word: &str) -> Option<Piece<'static>> {
    if let Some(kind) = colon_kind(word) {
        return Some(Piece::Inline(dice_span(kind)));
    }
    let (_, label, count) = COLON_DIFFICULTY.iter().find(|(w, _, _)| *w == word)?;
    let dice: String = (0..*count).map(|_| dice_span("difficulty")).collect();
    Some(Piece::Inline(format!("{label} ({dice})")))
}

#[derive(Debug, Default)]
struct Writer {
    out: String,
    stack: Vec<Tag>,
}

impl Writer {
    fn push(&mut self, piece: Piece<'_>) {
        match piece {
            Piece::Text(text) => {
                if text.trim().is_empty() && !self.in_text_block() {
                    return;
                }
                self.ensure_block();
                self.out.push_str(text);
            }
            Piece::Inline(html) => {
                self.ensure_block();
                self.out.push_str(&html);
            }
            Piece::Toggle(tag) => {
                if self.open_in_block(tag) {
                    self.close(tag);
                } else {
                    self.open_inline(tag);
                }
            }
            Piece::Open(tag @ (Tag::Strong | Tag::Em)) => self.open_inline(tag),
            Piece::Open(Tag::Heading(level)) => {
                self.close_paragraph();
                self.open(Tag::Heading(level));
            }
            Piece::Open(Tag::List) => {
                self.close_paragraph();
                self.open(Tag::List);
            }
            Piece::Open(Tag::Item) => self.open_item(),
            Piece::Open(Tag::Paragraph) | Piece::Break | Piece::Close(Tag::Paragraph) => {
                self.close_paragraph();
            }
            Piece::ItemOrLight => {
                if self.stack.contains(&Tag::List) {
                    self.open_item();
                } else {
                    self.ensure_block();
                    self.out.push_str(&dice_span("light"));
                }
            }
            Piece::Close(Tag::List) => {
                if self.stack.contains(&Tag::List) {
                    self.close(Tag::List);
                } else {
                    // orphan closer: the author meant to open the list here
                    self.close_paragraph();
                    self.open(Tag::List);
                }
            }
            Piece::Close(Tag::Heading(_)) => {
                if let Some(open) = self
                    .stack
                    .iter()
                    .rev()
                    .copied()
                    .find(|t| matches!(t, Tag::Heading(_)))
                {
                    self.close(open);
                }
            }
            Piece::Close(tag) => {
                if self.stack.contains(&tag) {
                    self.close(tag);
                }
            }
            Piece::Newline => {
                self.close_paragraph();
                if self.stack.last() == Some(&Tag::Item) {
                    self.close(Tag::Item);
                }
            }
        }
    }

    fn in_text_block(&self) -> bool {
        self.stack
            .iter()
            .any(|t| matches!(t, Tag::Paragraph | Tag::Heading(_) | Tag::Item))
    }

    fn ensure_block(&mut self) {
        if self.in_text_block() {
            return;
        }
        if self.stack.last() == Some(&Tag::List) {
            self.open(Tag::Item);
        } else {
            self.open(Tag::Paragraph);
        }
    }

    fn open_in_block(&self, tag: Tag) -> bool {
        for open in self.stack.iter().rev() {
            if *open == tag {
                return true;
            }
            if !open.is_inline() {
                return false;
            }
        }
        false
    }

    fn open_inline(&mut self, tag: Tag) {
        self.ensure_block();
        self.open(tag);
    }

    fn open_item(&mut self) {
        if let Some(pos) = self.stack.iter().rposition(|t| *t == Tag::Item) {
            let tag = self.stack[pos];
            self.close(tag);
        } else {
            self.close_paragraph();
        }
        self.open(Tag::Item);
    }

    fn open(&mut self, tag: Tag) {
        self.out.push_str(&tag.open_html());
        self.stack.push(tag);
    }

    /// Closes `tag` and everything opened after it.
    fn close(&mut self, tag: Tag) {
        let Some(pos) = self.stack.iter().rposition(|t| *t == tag) else {
            return;
        };
        while self.stack.len() > pos {
            if let Some(open) = self.stack.pop() {
                self.out.push_str(&open.close_html());
            }
        }
    }

    /// Closes inline runs, paragraphs and headings, leaving lists and items.
    fn close_paragraph(&mut self) {
        while let Some(top) = self.stack.last().copied() {
            if top.is_inline() || matches!(top, Tag::Paragraph | Tag::Heading(_)) {
                self.close(top);
            } else {
                break;
            }
        }
    }

    fn finish(mut self) -> String {
        while let Some(open) = self.stack.pop() {
            self.out.push_str(&open.close_html());
        }
        self.out
    }
}

/// Rewrites dice tokens in plain text as words: `[BO]` becomes "Boost" and
/// `[DI][DI][DI]` becomes "3 Difficulty". Unknown tokens are left alone.
pub fn dice_to_words(text: &str) -> String {
    DICE_RUN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            let kinds: Vec<Option<&str>> = SINGLE_DICE
                .captures_iter(run)
                .map(|c| dice_kind(c.get(1).map_or("", |m| m.as_str())))
                .collect();
            let Some(Some(first)) = kinds.first().copied() else {
                return run.to_string();
            };
            if kinds.iter().all(|k| *k == Some(first)) {
                let word = dice_word(first);
                if kinds.len() == 1 {
                    word.to_string()
                } else {
                    format!("{} {}", kinds.len(), word)
                }
            } else {
                SINGLE_DICE
                    .replace_all(run, |c: &regex::Captures<'_>| {
                        match dice_kind(&c[1]) {
                            Some(kind) => format!("{} ", dice_word(kind)),
                            None => c[0].to_string(),
                        }
                    })
                    .trim_end()
                    .to_string()
            }
        })
        .into_owned()
}

/// Strips markup down to plain text; used where a field does not accept HTML.
pub fn plain_text(text: &str) -> String {
    let words = dice_to_words(text);
    let stripped = TOKEN.replace_all(&words, |caps: &regex::Captures<'_>| {
        if caps.name("nl").is_some() {
            " ".to_string()
        } else if caps.name("colon").is_some() {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_p(html: &str) -> &str {
        html.strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
            .unwrap_or(html)
    }

    /// Checks open/close tags pair up in order.
    fn is_balanced(html: &str) -> bool {
        let tag = Regex::new(r"<(/?)(strong|em|p|ul|li|h[1-6])>").expect("regex");
        let mut stack = Vec::new();
        for caps in tag.captures_iter(html) {
            let name = caps[2].to_string();
            if caps[1].is_empty() {
                stack.push(name);
            } else if stack.pop().as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        stack.is_empty()
    }

    #[test]
    fn dice_tags_become_spans() {
        let html = translate("Roll [AB] + [DI] for this check");
        assert_eq!(
            strip_p(&html),
            format!(
                "Roll {} + {} for this check",
                dice_span("ability"),
                dice_span("difficulty")
            )
        );
        let html = translate("[LIGHTSIDE] and [DARKSIDE] points");
        assert!(html.contains(&dice_span("light")));
        assert!(html.contains(&dice_span("dark")));
        assert!(translate("Use [FO] to determine [LI] or [DA]").contains(&dice_span("light")));
    }

    #[test]
    fn colon_tokens_become_spans() {
        let html = translate("Make a :difficulty: check with :boost: and :setback:.");
        assert!(html.contains("<span class=\"difficulty\""));
        assert!(html.contains("<span class=\"boost\""));
        assert!(html.contains("<span class=\"setback\""));
        assert!(!html.contains(":boost:"));
        let html = translate("a :hard: check");
        assert!(html.contains(&format!(
            "Hard ({0}{0}{0})",
            dice_span("difficulty")
        )));
    }

    #[test]
    fn headers_bold_and_lines() {
        let html = translate("[H3]Curved Hilt[h3]\nThe hilt.\n[P][B]Models Include:[b] None.");
        assert_eq!(
            html,
            "<h3>Curved Hilt</h3><p>The hilt.</p><p><strong>Models Include:</strong> None.</p>"
        );
    }

    #[test]
    fn authoring_defects_are_repaired() {
        assert_eq!(translate("[B]Note[b]: text"), "<p><strong>Note:</strong> text</p>");
        assert_eq!(translate("[B]typo[p] after"), "<p><strong>typo</strong> after</p>");
        assert_eq!(
            translate("[B][P]Swapped[/B][/P]"),
            "<p><strong>Swapped</strong></p>"
        );
        assert_eq!(
            translate("&lt;b&gt;bold&lt;/b&gt; &lt;ol&gt;&lt;li&gt;one&lt;/li&gt;&lt;/ol&gt;"),
            "<p><strong>bold</strong> </p><ul><li>one</li></ul>"
        );
    }

    #[test]
    fn unclosed_and_orphan_tags_are_balanced() {
        for input in [
            "[B]never closed",
            "[I]one [B]two[/I] three",
            "text [/UL] after",
            "[UL][LI]a[LI]b",
            "[/B][/I]stray closers[/P]",
            "[H3]open heading\nnext line",
            "[B][B][b][b][b]",
            "",
            "[",
            "]]][[[",
        ] {
            let html = translate(input);
            assert!(is_balanced(&html), "unbalanced for {input:?}: {html}");
        }
        assert_eq!(
            translate("text [/UL] after"),
            "<p>text </p><ul><li> after</li></ul>"
        );
    }

    #[test]
    fn list_items_inside_lists_and_light_side_outside() {
        assert_eq!(
            translate("[UL][LI]one[/LI][LI]two[/LI][/UL]"),
            "<ul><li>one</li><li>two</li></ul>"
        );
        assert_eq!(translate("[LI]"), format!("<p>{}</p>", dice_span("light")));
    }

    #[test]
    fn unknown_tags_stay_visible() {
        assert_eq!(
            translate("see [FOO] here"),
            "<p>see <span class=\"oggdude-tag\">[FOO]</span> here</p>"
        );
    }

    #[test]
    fn raw_html_is_merged_into_the_same_structure() {
        let html = translate("<strong>Roll [PR] vs [CH]</strong> and get [BO] or [SE]");
        assert!(html.starts_with("<p><strong>Roll "));
        assert!(html.contains(&dice_span("proficiency")));
        assert!(is_balanced(&html));
    }

    #[test]
    fn translate_is_deterministic() {
        let input = "[H4]Title[h4]\n[B]Bold[b] [DI][DI] :easy:";
        assert_eq!(translate(input), translate(input));
    }

    #[test]
    fn dice_words_for_plain_text() {
        assert_eq!(dice_to_words("[BO]"), "Boost");
        assert_eq!(dice_to_words("Add [SE][SE] to checks"), "Add 2 Setback to checks");
        assert_eq!(dice_to_words("[DI][DI][DI]"), "3 Difficulty");
        assert_eq!(dice_to_words("gain [AD]"), "gain Advantage");
        assert_eq!(dice_to_words("[SU][AD]"), "Success Advantage");
        assert_eq!(dice_to_words("[XYZ]"), "[XYZ]");
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("[B]Adds[b] automatic [ADVANTAGE]\nto checks"),
            "Adds automatic Advantage to checks"
        );
    }
}
