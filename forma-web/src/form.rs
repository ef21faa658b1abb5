//! HTML rendering for the conversion form.

use forma_core::contenttype::ALLOWED_EXTENSIONS;

/// Render the conversion form, optionally with a flash message from a
/// failed attempt.
pub fn render_form(flash: Option<&str>) -> String {
    let options: String = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!("<option value=\"{0}\">{0}</option>", ext))
        .collect();

    let flash_html = match flash {
        Some(msg) => format!("<p class=\"flash\">{}</p>\n  ", escape_html(msg)),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>forma — convert a file</title>
</head>
<body>
  {flash_html}<h1>Convert a file</h1>
  <form action="/" method="post" enctype="multipart/form-data">
    <label>Convert from
      <select name="convert_from">{options}</select>
    </label>
    <label>Convert to
      <select name="convert_to">{options}</select>
    </label>
    <input type="file" name="upload_input_file">
    <button type="submit">Convert</button>
  </form>
</body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
