/*!
Class-name cleaning.

Build tools decorate class names with content hashes (`Button_root__a1b2c`,
`sc-bdVaJa`, `css-1x2y3z`) and utility frameworks emit classes that say
nothing about what an element *is* (`flex`, `p-4`, `w-[20px]`). Selectors
built from either break on the next deploy or read as noise.
*/

use std::sync::LazyLock;

use regex::Regex;

/// `base` + (`__` or `-`/`_`) + 5 or more alphanumerics.
static HASH_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?P<base>.+?)(?P<sep>__|[-_])(?P<hash>[A-Za-z0-9]{5,})$")
    .expect("BUG: invalid HASH_SUFFIX_RE regex literal")
});

/// Emotion: `css-<hash>` with an optional `-<label>`.
static EMOTION_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^css-[a-z0-9]+(?:-(?P<label>.+))?$").expect("BUG: invalid EMOTION_RE regex literal")
});

/// styled-components and styled-jsx generated names.
static GENERATED_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:sc-[A-Za-z0-9_-]+|jsx-\d+)$").expect("BUG: invalid GENERATED_RE regex literal")
});

/// Utility classes that match by prefix.
const UTILITY_PREFIXES: &[&str] = &[
  "text-", "bg-", "p-", "px-", "py-", "pt-", "pb-", "pl-", "pr-", "m-", "mx-", "my-", "mt-", "mb-",
  "ml-", "mr-", "w-", "h-", "min-w-", "min-h-", "max-w-", "max-h-", "gap-", "space-", "font-",
  "leading-", "tracking-", "items-", "justify-", "self-", "content-", "z-", "opacity-", "overflow-",
  "cursor-", "top-", "left-", "right-", "bottom-", "inset-", "duration-", "ease-", "delay-", "col-",
  "row-", "order-", "aspect-", "object-", "fill-", "stroke-", "ring-", "outline-", "divide-",
  "translate-", "scale-", "rotate-", "-m", "-translate-",
];

/// Utility classes that match exactly or as `name-…`.
const UTILITY_WORDS: &[&str] = &[
  "flex", "grid", "block", "inline", "hidden", "contents", "border", "rounded", "shadow",
  "transition", "absolute", "relative", "fixed", "sticky", "static", "truncate", "underline",
  "uppercase", "lowercase", "capitalize", "italic", "container", "sr-only", "grow", "shrink",
  "visible", "invisible", "antialiased",
];

/// Strip build-tool decoration from one class. `None` if nothing stable is left.
pub fn clean_class(class: &str) -> Option<String> {
  let class = class.trim();
  if class.is_empty() || class.contains('[') || GENERATED_RE.is_match(class) {
    return None;
  }

  if let Some(caps) = EMOTION_RE.captures(class) {
    return caps.name("label").map(|label| label.as_str().to_string());
  }

  let stripped = match HASH_SUFFIX_RE.captures(class) {
    Some(caps) => {
      let hash = caps.name("hash").map_or("", |m| m.as_str());
      let double = caps.name("sep").is_some_and(|m| m.as_str() == "__");
      if double || hash.chars().any(|c| c.is_ascii_digit()) {
        caps.name("base").map_or(class, |m| m.as_str())
      } else {
        class
      }
    }
    None => class,
  };

  let stripped = stripped.trim_end_matches(['-', '_']);
  (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Clean and deduplicate a class list, keeping first-seen order.
pub fn clean_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for cleaned in classes.into_iter().filter_map(clean_class) {
    if !out.contains(&cleaned) {
      out.push(cleaned);
    }
  }
  out
}

/// Tailwind-style utility class (including variant prefixes like `md:`).
pub fn is_utility_class(class: &str) -> bool {
  if class.contains(':') || class.contains('/') {
    return true;
  }
  UTILITY_PREFIXES.iter().any(|p| class.starts_with(p))
    || UTILITY_WORDS
      .iter()
      .any(|w| class == *w || class.strip_prefix(w).is_some_and(|rest| rest.starts_with('-')))
}

/// The class that best describes an element: the first cleaned,
/// non-utility class longer than two characters, else the first cleaned
/// class longer than two characters.
pub fn meaningful_class<'a>(classes: impl IntoIterator<Item = &'a str>) -> Option<String> {
  let cleaned = clean_classes(classes);
  let long_enough = |c: &&String| c.chars().count() > 2;
  cleaned
    .iter()
    .filter(long_enough)
    .find(|c| !is_utility_class(c))
    .or_else(|| cleaned.iter().find(long_enough))
    .cloned()
}
