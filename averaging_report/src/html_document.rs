//! HTML document sink: the reference image, every group's averaged image and
//! the statistics table on one page.

use noise_averaging::StatResult;

const IMAGES_PER_ROW: usize = 3;

/// One averaged image and the row of statistics it belongs to.
#[derive(Debug, Clone)]
pub struct GroupFigure {
    pub stat: StatResult,
    /// Location of the averaged image, relative to the document.
    pub image_href: String,
}

#[derive(Debug)]
pub struct HtmlDocument {
    title: String,
    reference_href: String,
    figures: Vec<GroupFigure>,
}

impl HtmlDocument {
    pub fn new(title: impl Into<String>, reference_href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reference_href: reference_href.into(),
            figures: Vec::new(),
        }
    }

    pub fn add_figure(&mut self, figure: GroupFigure) {
        self.figures.push(figure);
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    fn styles() -> &'static str {
        r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        h1, h2 {
            color: #333;
        }
        table {
            border-collapse: collapse;
            background-color: white;
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 8px;
            text-align: center;
            vertical-align: middle;
        }
        th {
            background-color: #4a90d9;
            color: white;
        }
        img.reference {
            max-width: 360px;
        }
        img.group {
            max-width: 160px;
        }
        .number {
            font-family: monospace;
        }
        "#
    }

    fn render_gallery(&self) -> String {
        let mut html = String::from("<table class=\"gallery\">\n");
        for row in self.figures.chunks(IMAGES_PER_ROW) {
            html.push_str("<tr>");
            for figure in row {
                html.push_str(&format!(
                    "<td><img class=\"group\" src=\"{}\" alt=\"k={k}\"><h3>k={k}</h3></td>",
                    Self::escape_html(&figure.image_href),
                    k = figure.stat.k,
                ));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
        html
    }

    fn render_statistics(&self) -> String {
        let mut html = String::from(
            "<table class=\"stats\">\n<tr><th>Sample Groups</th><th>Average</th><th>Average Variance</th></tr>\n",
        );
        for figure in &self.figures {
            html.push_str(&format!(
                "<tr><td class=\"number\">{}</td><td class=\"number\">{:.4}</td><td class=\"number\">{:.4}</td></tr>\n",
                figure.stat.k, figure.stat.average, figure.stat.variance
            ));
        }
        html.push_str("</table>\n");
        html
    }

    pub fn to_html(&self) -> String {
        let title = Self::escape_html(&self.title);
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{title}</title>\n"));
        html.push_str(&format!("<style>{}</style>\n", Self::styles()));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{title}</h1>\n"));

        html.push_str("<h2>Original Image</h2>\n");
        html.push_str(&format!(
            "<img class=\"reference\" src=\"{}\" alt=\"original\">\n",
            Self::escape_html(&self.reference_href)
        ));

        html.push_str("<h2>Denoised Images</h2>\n");
        html.push_str(&self.render_gallery());

        html.push_str("<h2>Statistics</h2>\n");
        html.push_str(&self.render_statistics());

        html.push_str("</body>\n</html>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure(k: usize) -> GroupFigure {
        GroupFigure {
            stat: StatResult {
                k,
                average: 128.0,
                variance: 800.0 / k as f64,
            },
            image_href: format!("result_for_{k}_samples.png"),
        }
    }

    #[test]
    fn gallery_wraps_every_three_images() {
        let mut doc = HtmlDocument::new("Averaging", "original.png");
        for k in [1, 5, 10, 50, 100] {
            doc.add_figure(figure(k));
        }
        let gallery = doc.render_gallery();
        assert_eq!(gallery.matches("<tr>").count(), 2);
        assert!(gallery.contains("<h3>k=100</h3>"));
    }

    #[test]
    fn statistics_table_has_one_row_per_group() {
        let mut doc = HtmlDocument::new("Averaging", "original.png");
        doc.add_figure(figure(1));
        doc.add_figure(figure(5));
        let html = doc.to_html();
        assert!(html.contains("<td class=\"number\">800.0000</td>"));
        assert!(html.contains("<td class=\"number\">160.0000</td>"));
        assert!(html.contains("src=\"original.png\""));
    }

    #[test]
    fn title_and_paths_are_escaped() {
        let doc = HtmlDocument::new("<script>", "a\"b.png");
        let html = doc.to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a&quot;b.png"));
        assert!(!html.contains("<script>"));
    }
}
