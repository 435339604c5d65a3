//! Plain-text tree rendering of an outline.

use guidebook_core::{Chapter, Outline, Section};

const DONE: char = '●';
const OPEN: char = '○';

fn completion_symbol(completed: bool) -> char {
    if completed {
        DONE
    } else {
        OPEN
    }
}

/// Render an outline as an ASCII tree, chapters and sections in display order.
///
/// Example output:
/// ```text
/// Getting Started (1/2 sections, 50%)
/// ├── ● Introduction [chapter1]
/// │   ├── ● Welcome [c1s1] (5 min)
/// │   └── ○ Setup [c1s2]
/// └── ○ New Chapter [chapter2]
/// ```
pub fn render_outline(outline: &Outline) -> String {
    let progress = outline.progress().sections;
    let mut output = format!(
        "{} ({}/{} sections, {}%)\n",
        outline.title,
        progress.completed,
        progress.total,
        progress.percent()
    );

    let chapters = outline.chapters();
    for (i, chapter) in chapters.iter().enumerate() {
        render_chapter(&mut output, chapter, i == chapters.len() - 1);
    }
    output
}

fn render_chapter(output: &mut String, chapter: &Chapter, is_last: bool) {
    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(branch);
    output.push(completion_symbol(chapter.completed));
    output.push(' ');
    output.push_str(&format!("{} [{}]\n", chapter.title, chapter.id));

    let prefix = if is_last { "    " } else { "│   " };
    for (i, section) in chapter.sections.iter().enumerate() {
        render_section(output, section, prefix, i == chapter.sections.len() - 1);
    }
}

fn render_section(output: &mut String, section: &Section, prefix: &str, is_last: bool) {
    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(prefix);
    output.push_str(branch);
    output.push(completion_symbol(section.completed));
    output.push(' ');
    output.push_str(&format!("{} [{}]", section.title, section.id));
    if !section.duration.is_empty() {
        output.push_str(&format!(" ({})", section.duration));
    }
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, title: &str, completed: bool, duration: &str) -> Section {
        let mut section = Section::new(id, title);
        section.completed = completed;
        section.duration = duration.to_string();
        section
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::new("Getting Started", "");
        assert_eq!(render_outline(&outline), "Getting Started (0/0 sections, 0%)\n");
    }

    #[test]
    fn test_chapters_and_sections() {
        let mut intro = Chapter::new("chapter1", "Introduction", "")
            .with_section(section("c1s1", "Welcome", true, "5 min"))
            .with_section(section("c1s2", "Setup", false, ""));
        intro.completed = true;
        let outline = Outline::from_parts(
            "Getting Started",
            "",
            vec![intro, Chapter::new("chapter2", "New Chapter", "")],
        )
        .unwrap();

        let expected = "Getting Started (1/2 sections, 50%)\n\
                        ├── ● Introduction [chapter1]\n\
                        │   ├── ● Welcome [c1s1] (5 min)\n\
                        │   └── ○ Setup [c1s2]\n\
                        └── ○ New Chapter [chapter2]\n";
        assert_eq!(render_outline(&outline), expected);
    }

    #[test]
    fn test_sections_under_last_chapter_use_blank_prefix() {
        let outline = Outline::from_parts(
            "Guide",
            "",
            vec![Chapter::new("chapter1", "Only", "").with_section(section("c1s1", "One", false, ""))],
        )
        .unwrap();

        assert_eq!(
            render_outline(&outline),
            "Guide (0/1 sections, 0%)\n└── ○ Only [chapter1]\n    └── ○ One [c1s1]\n"
        );
    }
}
