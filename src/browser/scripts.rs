// Injected JavaScript for WebDriver `execute/sync`
// Every script is the body of a function; arguments arrive via `arguments[n]`
// and the first argument is always a serialized Locator (or a CSS string)

/// Shared helpers prepended to every action script
const PRELUDE: &str = r#"
const norm = (s) => (s || '').replace(/[\s ]+/g, ' ').trim().toLowerCase();
const visible = (el) => {
    if (!el || !el.getBoundingClientRect) return false;
    const r = el.getBoundingClientRect();
    const st = window.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && st.visibility !== 'hidden' && st.display !== 'none';
};
const CONTROL = 'input, select, textarea, [role="slider"], [role="radiogroup"], [role="combobox"]';
const textOf = (el) => norm(el.innerText || el.textContent || el.value || el.getAttribute('aria-label'));
const findControl = (start) => {
    for (let n = start; n && n !== document.body; n = n.parentElement) {
        if (n.matches && n.matches(CONTROL)) return n;
        const inner = n.querySelector && n.querySelector(CONTROL);
        if (inner) return inner;
    }
    return null;
};
const byText = (needle, selector, root) => {
    const want = norm(needle);
    let best = null;
    let bestLen = Infinity;
    for (const el of (root || document).querySelectorAll(selector)) {
        if (!visible(el)) continue;
        const t = textOf(el);
        if (!t.includes(want)) continue;
        if (t.length < bestLen) { best = el; bestLen = t.length; }
    }
    return best;
};
const resolve = (loc) => {
    switch (loc.kind) {
        case 'id': return document.getElementById(loc.value);
        case 'css': return document.querySelector(loc.value);
        case 'label': {
            const want = norm(loc.value);
            for (const lab of document.querySelectorAll('label')) {
                if (!norm(lab.textContent).includes(want)) continue;
                if (lab.htmlFor) {
                    const target = document.getElementById(lab.htmlFor);
                    if (target) return target;
                }
                const near = findControl(lab);
                if (near) return near;
            }
            const anchor = byText(loc.value, 'legend, span, p, div, h2, h3, h4');
            return anchor ? findControl(anchor) : null;
        }
        case 'text': return byText(loc.value, 'label, button, a, span, p, div, [role="radio"], [role="option"]');
        case 'button': return byText(loc.value, 'button, [role="button"], input[type="submit"], a');
    }
    return null;
};
const asInput = (el) => {
    if (!el) return null;
    if (el.matches('input, textarea')) return el;
    const c = findControl(el);
    return c && c.matches('input, textarea') ? c : null;
};
const setNative = (el, value) => {
    const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, value);
};
"#;

const FILL: &str = r#"
const el = asInput(resolve(arguments[0]));
if (!el) return false;
el.scrollIntoView({block: 'center'});
el.focus();
setNative(el, arguments[1]);
el.dispatchEvent(new Event('input', {bubbles: true}));
el.dispatchEvent(new Event('change', {bubbles: true}));
el.blur();
el.dispatchEvent(new Event('blur'));
return true;
"#;

const READ_VALUE: &str = r#"
const el = asInput(resolve(arguments[0]));
return el ? String(el.value == null ? '' : el.value) : null;
"#;

const SELECT: &str = r#"
const el = resolve(arguments[0]);
if (!el) return false;
const value = arguments[1];
const label = norm(arguments[2]);
const target = el.tagName === 'SELECT' ? el : (el.querySelector ? el.querySelector('select') : null) || el;
if (target.tagName === 'SELECT') {
    const opt = Array.from(target.options).find((o) => o.value === value || norm(o.textContent) === label)
        || Array.from(target.options).find((o) => norm(o.textContent).includes(label));
    if (!opt) return false;
    target.value = opt.value;
    target.dispatchEvent(new Event('input', {bubbles: true}));
    target.dispatchEvent(new Event('change', {bubbles: true}));
    return true;
}
if (target.matches('input[type="radio"], input[type="checkbox"], [role="radio"], [role="option"], button')) {
    target.click();
    return true;
}
for (const r of target.querySelectorAll('input[type="radio"], [role="radio"]')) {
    const labelText = r.labels && r.labels.length ? norm(r.labels[0].textContent) : textOf(r.parentElement);
    if (r.value === value || labelText.includes(label)) {
        (r.labels && r.labels.length ? r.labels[0] : r).click();
        return true;
    }
}
const tile = byText(arguments[2], 'button, [role="button"], [role="radio"], [role="option"], label', target);
if (tile) { tile.click(); return true; }
target.click();
return true;
"#;

const READ_SELECTION: &str = r#"
const el = resolve(arguments[0]);
if (!el) return null;
const target = el.tagName === 'SELECT' ? el : (el.querySelector ? el.querySelector('select') : null);
if (target) {
    const opt = target.options[target.selectedIndex];
    return opt ? (opt.value + ' ' + opt.textContent).trim() : null;
}
if (el.matches('input[type="radio"], input[type="checkbox"]')) {
    return el.checked ? (el.value + ' ' + textOf(el.parentElement)).trim() : '';
}
const checked = el.querySelector('input[type="radio"]:checked, [role="radio"][aria-checked="true"], [aria-selected="true"]');
if (!checked) return '';
const labelText = checked.labels && checked.labels.length ? checked.labels[0].textContent : checked.textContent;
return ((checked.value || '') + ' ' + (labelText || '')).trim();
"#;

const CLICK: &str = r#"
const el = resolve(arguments[0]);
if (!el) return false;
el.scrollIntoView({block: 'center'});
el.click();
return true;
"#;

const SET_SLIDER: &str = r#"
const el = asInput(resolve(arguments[0]));
if (!el) return false;
setNative(el, String(arguments[1]));
el.dispatchEvent(new Event('change', {bubbles: true}));
el.dispatchEvent(new Event('input', {bubbles: true}));
return true;
"#;

const IS_VISIBLE: &str = r#"
return visible(resolve(arguments[0]));
"#;

const READ_TEXTS: &str = r#"
return Array.from(document.querySelectorAll(arguments[0]))
    .filter(visible)
    .map((el) => (el.innerText || el.textContent || '').trim())
    .filter((t) => t.length > 0);
"#;

const READ_GRID: &str = r#"
const layout = arguments[0];
const panel = document.querySelector(layout.panel);
if (!panel) return null;
const rows = [];
for (const row of panel.querySelectorAll(layout.row)) {
    const labelEl = row.querySelector(layout.label);
    const valueEl = row.querySelector(layout.value);
    if (!labelEl || !valueEl) continue;
    rows.push([(labelEl.innerText || labelEl.textContent || '').trim(), (valueEl.innerText || valueEl.textContent || '').trim()]);
}
return rows;
"#;

const READY_STATE: &str = "return document.readyState;";

/// Which injected script to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Fill,
    ReadValue,
    Select,
    ReadSelection,
    Click,
    SetSlider,
    IsVisible,
    ReadTexts,
    ReadGrid,
    ReadyState,
}

impl Script {
    fn body(self) -> &'static str {
        match self {
            Script::Fill => FILL,
            Script::ReadValue => READ_VALUE,
            Script::Select => SELECT,
            Script::ReadSelection => READ_SELECTION,
            Script::Click => CLICK,
            Script::SetSlider => SET_SLIDER,
            Script::IsVisible => IS_VISIBLE,
            Script::ReadTexts => READ_TEXTS,
            Script::ReadGrid => READ_GRID,
            Script::ReadyState => READY_STATE,
        }
    }

    /// Full source sent to the driver; grid/text/readiness scripts need no resolver
    pub fn source(self) -> String {
        match self {
            Script::ReadGrid | Script::ReadyState => self.body().to_string(),
            _ => format!("{}{}", PRELUDE, self.body()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Script::Fill => "fill",
            Script::ReadValue => "read_value",
            Script::Select => "select",
            Script::ReadSelection => "read_selection",
            Script::Click => "click",
            Script::SetSlider => "set_slider",
            Script::IsVisible => "is_visible",
            Script::ReadTexts => "read_texts",
            Script::ReadGrid => "read_grid",
            Script::ReadyState => "ready_state",
        }
    }
}
