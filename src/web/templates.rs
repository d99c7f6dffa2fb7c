use chrono::{Datelike, Utc};

const LINK_GLYPH: &str = "\u{1F517}";

pub const PUBLIC_PAGE_STYLES: &str = r#"
        :root { color-scheme: light dark; --bg: #f8fafc; --card: #ffffff; --border: #e2e8f0; --text: #0f172a; --muted: #64748b; --primary: #6366f1; }
        @media (prefers-color-scheme: dark) { :root { --bg: #0b1120; --card: #111827; --border: #1f2937; --text: #e2e8f0; --muted: #94a3b8; } }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: var(--bg); color: var(--text); }
        main { max-width: 32rem; margin: 0 auto; padding: 3rem 1rem; box-sizing: border-box; }
        .profile { text-align: center; margin-bottom: 2.5rem; }
        .avatar { width: 6rem; height: 6rem; margin: 0 auto 1rem; border-radius: 999px; display: flex; align-items: center; justify-content: center; background: linear-gradient(135deg, var(--primary), #a855f7); color: #ffffff; font-size: 2rem; font-weight: 700; object-fit: cover; }
        .profile h1 { margin: 0; font-size: 1.6rem; }
        .profile p { margin: 0.5rem 0 0; color: var(--muted); }
        .cards { display: flex; flex-direction: column; gap: 0.75rem; }
        .card { display: flex; align-items: center; gap: 0.75rem; padding: 1rem; border-radius: 14px; background: var(--card); border: 1px solid var(--border); color: inherit; text-decoration: none; transition: transform 0.15s ease, border 0.15s ease; }
        .card:hover { transform: translateY(-2px); border-color: var(--primary); }
        .card .glyph { width: 2.5rem; height: 2.5rem; border-radius: 10px; display: flex; align-items: center; justify-content: center; background: rgba(99, 102, 241, 0.12); flex-shrink: 0; }
        .card .text { min-width: 0; flex: 1; }
        .card h2, .card h3 { margin: 0; font-size: 1rem; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
        .card small { color: var(--muted); display: block; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
        .group-title { margin: 1.5rem 0 0.75rem; font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.08em; color: var(--muted); }
        .back-link { display: inline-block; margin-bottom: 1.5rem; padding: 0.5rem 1rem; border-radius: 999px; border: 1px solid var(--border); color: var(--muted); text-decoration: none; }
        .empty { text-align: center; color: var(--muted); padding: 3rem 0; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: var(--muted); }
"#;

/// Glyph for an icon tag. `link` and unknown tags share the link glyph.
pub fn icon_glyph(name: &str) -> &'static str {
    match name {
        "github" => "\u{1F419}",
        "twitter" => "\u{1F426}",
        "instagram" => "\u{1F4F7}",
        "facebook" => "\u{1F465}",
        "linkedin" => "\u{1F4BC}",
        "youtube" => "\u{25B6}\u{FE0F}",
        "twitch" => "\u{1F3AE}",
        "discord" | "message-circle" => "\u{1F4AC}",
        "tiktok" | "music" => "\u{1F3B5}",
        "globe" => "\u{1F310}",
        "mail" => "\u{2709}\u{FE0F}",
        "phone" => "\u{1F4DE}",
        "map-pin" => "\u{1F4CD}",
        "book-open" => "\u{1F4D6}",
        "file-text" => "\u{1F4C4}",
        "shopping-bag" => "\u{1F6CD}\u{FE0F}",
        "coffee" => "\u{2615}",
        "heart" => "\u{2764}\u{FE0F}",
        "star" => "\u{2B50}",
        "camera" => "\u{1F4F8}",
        "video" => "\u{1F3AC}",
        "code" => "\u{1F4BB}",
        "terminal" => "\u{2328}\u{FE0F}",
        "palette" => "\u{1F3A8}",
        "pen-tool" => "\u{270F}\u{FE0F}",
        "briefcase" => "\u{1F454}",
        "calendar" => "\u{1F4C5}",
        "folder" => "\u{1F4C1}",
        _ => LINK_GLYPH,
    }
}

/// Avatar image when a URL is set, otherwise the initial in a gradient disc.
pub fn render_profile_header(
    title: &str,
    description: &str,
    initial: &str,
    image_url: Option<&str>,
) -> String {
    let avatar = match image_url.filter(|url| !url.is_empty()) {
        Some(url) => format!(
            r#"<img class="avatar" src="{src}" alt="Profile">"#,
            src = escape_html(url)
        ),
        None => format!(
            r#"<div class="avatar">{initial}</div>"#,
            initial = escape_html(initial)
        ),
    };

    format!(
        r#"<header class="profile">{avatar}<h1>{title}</h1><p>{description}</p></header>"#,
        title = escape_html(title),
        description = escape_html(description),
    )
}

pub fn render_public_page(meta_title: &str, meta_description: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{meta_description}">
    <meta property="og:title" content="{meta_title}">
    <meta property="og:description" content="{meta_description}">
    <meta property="og:type" content="website">
    <style>
{styles}
    </style>
</head>
<body>
    <main>
{body}
        {footer}
    </main>
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        meta_description = escape_html(meta_description),
        styles = PUBLIC_PAGE_STYLES,
        footer = render_footer(),
    )
}

pub fn render_login_page() -> String {
    let footer = render_footer();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Admin login</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        :root {{ color-scheme: light; }}
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; }}
        main {{ width: 100%; max-width: 420px; display: flex; flex-direction: column; align-items: center; gap: 1.5rem; }}
        .panel {{ background: #ffffff; padding: 2.5rem 2.25rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); width: 100%; border: 1px solid #e2e8f0; box-sizing: border-box; }}
        h1 {{ margin: 0 0 1.5rem; font-size: 1.6rem; text-align: center; }}
        label {{ display: block; font-weight: 600; color: #0f172a; }}
        input {{ width: 100%; padding: 0.85rem; margin-top: 0.65rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; font-size: 1rem; box-sizing: border-box; }}
        input:focus {{ outline: none; border-color: #6366f1; box-shadow: 0 0 0 3px rgba(99, 102, 241, 0.15); }}
        button {{ margin-top: 1.5rem; width: 100%; padding: 0.95rem; border: none; border-radius: 10px; background: #6366f1; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; }}
        button:disabled {{ opacity: 0.6; cursor: not-allowed; }}
        .error {{ margin-top: 1rem; color: #b91c1c; min-height: 1.25rem; font-size: 0.95rem; }}
        .app-footer {{ text-align: center; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <main>
        <section class="panel">
            <h1>Admin login</h1>
            <form id="login-form">
                <label for="password">Password</label>
                <input id="password" type="password" name="password" autocomplete="current-password" required>
                <button type="submit">Sign in</button>
                <p class="error" id="login-error"></p>
            </form>
        </section>
        {footer}
    </main>
    <script>
        const form = document.getElementById('login-form');
        const errorBox = document.getElementById('login-error');
        form.addEventListener('submit', async (event) => {{
            event.preventDefault();
            const button = form.querySelector('button');
            button.disabled = true;
            errorBox.textContent = '';
            try {{
                const response = await fetch('/api/auth/login', {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/json' }},
                    body: JSON.stringify({{ password: form.password.value }}),
                }});
                const payload = await response.json();
                if (payload.success) {{
                    window.location.href = '/admin';
                    return;
                }}
                errorBox.textContent = payload.error || 'Login failed';
            }} catch (err) {{
                errorBox.textContent = 'Login failed';
            }} finally {{
                button.disabled = false;
            }}
        }});
    </script>
</body>
</html>"#,
        footer = footer,
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} · Powered by linkpage</footer>"#)
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
