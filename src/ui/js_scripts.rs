//! JavaScript executed in page scope by the UI interactor.
//!
//! Scripts return JSON-serializable values only. Selector heuristics live
//! here rather than in Rust so one evaluate round-trip covers each decision.

/// Select the maximum option of a native "rows per page" `<select>`.
///
/// Returns `{changed: bool, value: number|null}`.
pub const SELECT_NATIVE_MAX: &str = r#"
(() => {
    const pattern = /show|entries|rows|users|per page|display|view \d+|amount of|page size|limit/i;
    const contextText = (el) => {
        const bits = [
            el.getAttribute('aria-label') || '',
            el.getAttribute('name') || '',
            el.id || '',
            el.parentElement ? el.parentElement.textContent.slice(0, 120) : '',
        ];
        return bits.join(' ');
    };
    for (const select of document.querySelectorAll('select')) {
        if (!pattern.test(contextText(select))) continue;
        let best = null;
        for (const option of select.options) {
            for (const source of [option.value, option.textContent]) {
                const n = parseInt(String(source).replace(/[^0-9]/g, ''), 10);
                if (Number.isFinite(n) && n > 0 && n <= 10000 && (!best || n > best.n)) {
                    best = { n, value: option.value };
                }
            }
        }
        if (!best) continue;
        select.value = best.value;
        select.dispatchEvent(new Event('change', { bubbles: true }));
        select.dispatchEvent(new Event('input', { bubbles: true }));
        return { changed: true, value: best.n };
    }
    return { changed: false, value: null };
})()
"#;

/// Scan for custom dropdown triggers near row-selector text.
///
/// Returns an array of `{x, y, area}` candidates, best first. Smaller, more
/// specific triggers score higher.
pub const SCAN_DROPDOWN_TRIGGERS: &str = r#"
(() => {
    const pattern = /show|entries|rows|users|per page|display|view \d+|amount of|page size|limit/i;
    const candidates = [];
    const isVisible = (el) => {
        const r = el.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && getComputedStyle(el).visibility !== 'hidden';
    };
    const selectors = [
        '[role=combobox]', '[role=listbox]', '[role=menuitem]',
        'button[aria-haspopup=listbox]', 'button[aria-haspopup=menu]',
    ];
    for (const sel of selectors) {
        for (const el of document.querySelectorAll(sel)) {
            if (!isVisible(el)) continue;
            const r = el.getBoundingClientRect();
            candidates.push({ x: r.x + r.width / 2, y: r.y + r.height / 2, area: r.width * r.height, score: 2 });
        }
    }
    // div-based triggers inside a leaderboard subtree whose context mentions
    // the row-selector wording
    const scopes = document.querySelectorAll('[class*=leaderboard], [class*=ranking], table, main');
    for (const scope of scopes) {
        for (const el of scope.querySelectorAll('div, span, button')) {
            if (!isVisible(el)) continue;
            const text = (el.textContent || '').slice(0, 80);
            if (!pattern.test(text)) continue;
            if (!/\d/.test(text)) continue;
            const r = el.getBoundingClientRect();
            if (r.width > 400 || r.height > 120) continue;
            candidates.push({ x: r.x + r.width / 2, y: r.y + r.height / 2, area: r.width * r.height, score: 1 });
        }
    }
    candidates.sort((a, b) => (b.score - a.score) || (a.area - b.area));
    return candidates.slice(0, 5).map(({ x, y, area }) => ({ x, y, area }));
})()
"#;

/// Click whatever sits at viewport coordinates, `elementFromPoint` first,
/// synthesized mouse events as fallback. Returns `true` when something was
/// clicked.
pub const CLICK_AT_POINT: &str = r"
((x, y) => {
    const el = document.elementFromPoint(x, y);
    if (!el) return false;
    try {
        el.click();
        return true;
    } catch (_) {
        for (const type of ['mousedown', 'mouseup', 'click']) {
            el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, clientX: x, clientY: y }));
        }
        return true;
    }
})
";

/// Keyboard fallback for stubborn dropdown triggers: focus, then dispatch
/// ArrowDown and Enter.
pub const KEYBOARD_OPEN_AT_POINT: &str = r"
((x, y) => {
    const el = document.elementFromPoint(x, y);
    if (!el) return false;
    el.focus();
    for (const key of ['ArrowDown', 'Enter']) {
        el.dispatchEvent(new KeyboardEvent('keydown', { key, bubbles: true }));
        el.dispatchEvent(new KeyboardEvent('keyup', { key, bubbles: true }));
    }
    return true;
})
";

/// Pick the largest numeric option (or "All") in a visible popover.
///
/// Returns `true` when an option was clicked.
pub const POPOVER_SELECT_MAX: &str = r#"
(() => {
    const wrappers = document.querySelectorAll(
        '[role=listbox], [role=menu], [data-radix-popper-content-wrapper], .MuiPopover-root, [class*=dropdown-menu], [class*=select__menu]'
    );
    let best = null;
    for (const wrapper of wrappers) {
        const r = wrapper.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) continue;
        for (const option of wrapper.querySelectorAll('[role=option], [role=menuitem], li, div, button')) {
            if (option.children.length > 1) continue;
            const text = (option.textContent || '').trim();
            if (/^all$/i.test(text)) { best = { el: option, n: Infinity }; continue; }
            const n = parseInt(text.replace(/[^0-9]/g, ''), 10);
            if (Number.isFinite(n) && n > 0 && n <= 10000 && text.length <= 12 && (!best || n > best.n)) {
                best = { el: option, n };
            }
        }
    }
    if (!best) return false;
    best.el.click();
    return true;
})()
"#;

/// Click a visible Show-All control. Returns `true` on click.
pub const CLICK_SHOW_ALL: &str = r#"
(() => {
    const pattern = /show all|view all|display all|load all/i;
    for (const el of document.querySelectorAll('button, a, [role=button]')) {
        const r = el.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) continue;
        if (pattern.test((el.textContent || '').trim())) {
            el.click();
            return true;
        }
    }
    return false;
})()
"#;

/// Click a pagination / Show-More control. Returns `true` on click.
pub const CLICK_SHOW_MORE: &str = r#"
(() => {
    const pattern = /^(next|more|load more|show more|view all)$|page \d+|\d+\s*-\s*\d+ of/i;
    for (const el of document.querySelectorAll('button, a, [role=button]')) {
        const r = el.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) continue;
        if (el.disabled || el.getAttribute('aria-disabled') === 'true') continue;
        if (pattern.test((el.textContent || '').trim())) {
            el.click();
            return true;
        }
    }
    return false;
})()
"#;

/// Count rows under the broad row-selector set.
pub const COUNT_ROWS: &str = r#"
(() => {
    const selectors = [
        'table tbody tr', 'table tr',
        '[class*=leaderboard] [class*=row]', '[class*=leaderboard] li',
        '[class*=rank] [class*=row]', '[class*=entry]', '[class*=player-row]',
        'ol li', 'ul[class*=list] li',
    ];
    let best = 0;
    for (const sel of selectors) {
        try { best = Math.max(best, document.querySelectorAll(sel).length); } catch (_) {}
    }
    return best;
})()
"#;

/// Detect leaderboard tabs/buttons by their visible text.
///
/// Returns an array of trimmed texts.
pub const DETECT_LEADERBOARD_TABS: &str = r#"
(() => {
    const pattern = /leaderboards?|rankings?|standings|top players|wager race/i;
    const texts = [];
    for (const el of document.querySelectorAll('a, button, [role=tab], [role=button]')) {
        const text = (el.textContent || '').trim();
        if (text.length > 0 && text.length <= 40 && pattern.test(text)) {
            texts.push(text);
        }
    }
    return [...new Set(texts)];
})()
"#;

/// Click the first clickable element whose trimmed text equals the argument
/// (case-insensitive). Returns `true` on click.
pub const CLICK_BY_TEXT: &str = r"
((wanted) => {
    const target = wanted.trim().toLowerCase();
    for (const el of document.querySelectorAll('a, button, [role=tab], [role=button], [class*=tab], [class*=switcher]')) {
        const text = (el.textContent || '').trim().toLowerCase();
        if (text === target) {
            el.scrollIntoView({ block: 'center' });
            el.click();
            return true;
        }
    }
    // looser pass: containment
    for (const el of document.querySelectorAll('a, button, [role=tab], [role=button]')) {
        const text = (el.textContent || '').trim().toLowerCase();
        if (text.length <= 60 && text.includes(target)) {
            el.click();
            return true;
        }
    }
    return false;
})
";

/// Scroll the first leaderboard-ish region into view.
pub const SCROLL_LEADERBOARD_INTO_VIEW: &str = r#"
(() => {
    const el = document.querySelector('[class*=leaderboard], [class*=ranking], table');
    if (el) el.scrollIntoView({ block: 'center' });
    return Boolean(el);
})()
"#;

/// One scroll step toward the bottom. Returns `true` when the document
/// bottom was reached.
pub const SCROLL_STEP: &str = r"
(() => {
    window.scrollBy(0, window.innerHeight);
    const doc = document.documentElement;
    return window.innerHeight + window.scrollY >= doc.scrollHeight - 2;
})()
";

pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0); true";

/// Capture layout boxes for the geometric strategy: visible block elements
/// with their rects and inner text.
pub const CAPTURE_LAYOUT_BOXES: &str = r#"
(() => {
    const boxes = [];
    const walk = (el) => {
        for (const child of el.children) {
            const style = getComputedStyle(child);
            if (style.display === 'none' || style.visibility === 'hidden') continue;
            const r = child.getBoundingClientRect();
            if (r.width >= 50 && r.height >= 20) {
                const text = (child.innerText || '').trim();
                if (text.length > 0 && text.length <= 400) {
                    boxes.push({
                        tag: child.tagName.toLowerCase(),
                        classes: child.className && child.className.baseVal === undefined ? String(child.className) : '',
                        text,
                        x: r.x + window.scrollX,
                        y: r.y + window.scrollY,
                        width: r.width,
                        height: r.height,
                    });
                }
            }
            walk(child);
        }
    };
    walk(document.body);
    return boxes.slice(0, 1500);
})()
"#;

/// Same-origin fetch executed in page scope so cookies/credentials apply.
/// Returns the body text or null.
pub const FETCH_IN_PAGE: &str = r"
(async (url) => {
    try {
        const resp = await fetch(url, { credentials: 'include' });
        if (!resp.ok) return null;
        return await resp.text();
    } catch (_) {
        return null;
    }
})
";
