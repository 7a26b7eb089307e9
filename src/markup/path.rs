//! A small XPath subset over the parsed tree.
//!
//! Supported: absolute (`/html/body/*`) and relative (`./x`, `.//x`, `../x`)
//! paths, name tests, `*`, `.`, `..` and a 1-based positional predicate
//! (`td[2]`). Implicit `tbody`/`thead`/`tfoot` wrappers inserted by the HTML
//! tree builder are transparent to child steps, so `table/tr` matches rows
//! whether or not the source markup spelled out a `tbody`.

use scraper::ElementRef;

use crate::text::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: Option<String>,
    position: Option<usize>,
}

impl Step {
    fn matches(&self, el: &ElementRef<'_>) -> bool {
        match &self.name {
            Some(name) => el.value().name().eq_ignore_ascii_case(name),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    absolute: bool,
    steps: Vec<Step>,
}

impl Path {
    pub fn parse(expr: &str) -> Path {
        let expr = expr.trim();
        let (absolute, body) = match expr.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, expr),
        };

        let mut steps = Vec::new();
        let mut descendant = false;
        for part in body.split('/') {
            if part.is_empty() {
                descendant = true;
                continue;
            }
            let step = match part {
                "." => Step { axis: Axis::SelfNode, name: None, position: None },
                ".." => Step { axis: Axis::Parent, name: None, position: None },
                _ => {
                    let (name, position) = split_predicate(part);
                    Step {
                        axis: if descendant { Axis::Descendant } else { Axis::Child },
                        name: (name != "*").then(|| name.to_ascii_lowercase()),
                        position,
                    }
                }
            };
            descendant = false;
            steps.push(step);
        }

        Path { absolute, steps }
    }

    /// Evaluate against `context`; results are deduplicated and keep their order.
    pub fn select<'a>(&self, context: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut steps = self.steps.iter();
        let mut current = if self.absolute {
            let root = root_element(context);
            match steps.next() {
                Some(first) if first.axis == Axis::Descendant => apply(first, vec![root], true),
                Some(first) if first.matches(&root) && first.position.unwrap_or(1) == 1 => vec![root],
                Some(_) => return Vec::new(),
                None => vec![root],
            }
        } else {
            vec![context]
        };

        for step in steps {
            current = apply(step, current, false);
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

fn split_predicate(part: &str) -> (&str, Option<usize>) {
    if let Some(open) = part.find('[') {
        let name = &part[..open];
        let position = part[open + 1..]
            .trim_end_matches(']')
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|p| *p > 0);
        (name, position)
    } else {
        (part, None)
    }
}

fn apply<'a>(step: &Step, nodes: Vec<ElementRef<'a>>, include_self: bool) -> Vec<ElementRef<'a>> {
    let mut out: Vec<ElementRef<'a>> = Vec::new();

    for node in nodes {
        match step.axis {
            Axis::SelfNode => push_unique(&mut out, node),
            Axis::Parent => {
                if let Some(parent) = node.parent().and_then(ElementRef::wrap) {
                    push_unique(&mut out, parent);
                }
            }
            Axis::Child => {
                let matching: Vec<ElementRef<'a>> = logical_children(node, step)
                    .into_iter()
                    .filter(|c| step.matches(c))
                    .collect();
                match step.position {
                    Some(p) => {
                        if let Some(el) = matching.get(p - 1) {
                            push_unique(&mut out, *el);
                        }
                    }
                    None => matching.into_iter().for_each(|el| push_unique(&mut out, el)),
                }
            }
            Axis::Descendant => {
                let skip = usize::from(!include_self);
                for el in node.descendants().skip(skip).filter_map(ElementRef::wrap) {
                    if !step.matches(&el) {
                        continue;
                    }
                    if let Some(p) = step.position {
                        if sibling_position(el, step) != p {
                            continue;
                        }
                    }
                    push_unique(&mut out, el);
                }
            }
        }
    }

    out
}

/// Element children, looking through implicit table section wrappers.
fn logical_children<'a>(node: ElementRef<'a>, step: &Step) -> Vec<ElementRef<'a>> {
    let is_table = node.value().name().eq_ignore_ascii_case("table");
    let wants_section = matches!(step.name.as_deref(), Some("tbody" | "thead" | "tfoot"));
    let mut out = Vec::new();

    for child in node.children().filter_map(ElementRef::wrap) {
        let name = child.value().name();
        if is_table && !wants_section && matches!(name, "tbody" | "thead" | "tfoot") {
            out.extend(child.children().filter_map(ElementRef::wrap));
        } else {
            out.push(child);
        }
    }
    out
}

/// 1-based position of `el` among its siblings that pass the step's name test.
fn sibling_position(el: ElementRef<'_>, step: &Step) -> usize {
    let Some(parent) = el.parent() else {
        return 1;
    };
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| step.matches(c))
        .position(|c| c == el)
        .map_or(1, |i| i + 1)
}

fn root_element(node: ElementRef<'_>) -> ElementRef<'_> {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .last()
        .unwrap_or(node)
}

fn push_unique<'a>(out: &mut Vec<ElementRef<'a>>, el: ElementRef<'a>) {
    if !out.contains(&el) {
        out.push(el);
    }
}

/// Evaluate `expr` relative to `context`.
pub fn select<'a>(context: ElementRef<'a>, expr: &str) -> Vec<ElementRef<'a>> {
    Path::parse(expr).select(context)
}

/// Whitespace-collapsed text content of an element.
pub fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}
