use std::io::BufWriter;

use printpdf::*;

use crate::error::{CashbookError, Result};
use crate::fmt::grouped;
use crate::models::{Transaction, TransactionType};
use crate::reports::{slug, Report};
use crate::stats::Totals;

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 22.0;
const MARGIN_LEFT: f32 = 14.0;
const MARGIN_RIGHT: f32 = 14.0;
const BAND_H: f32 = 40.0;
const ROW_H: f32 = 6.0;
const FONT_SIZE: f32 = 9.0;

const BRAND_RED: (f32, f32, f32) = (227.0, 30.0, 36.0);

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r / 255.0, g / 255.0, b / 255.0, None))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
    max_chars: usize,
}

const LEDGER_COLS: &[Col] = &[
    Col { width: 26.0, align: Align::Left, max_chars: 12 },
    Col { width: 58.0, align: Align::Left, max_chars: 32 },
    Col { width: 42.0, align: Align::Left, max_chars: 22 },
    Col { width: 28.0, align: Align::Right, max_chars: 16 },
    Col { width: 28.0, align: Align::Right, max_chars: 16 },
];

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| CashbookError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| CashbookError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            pages: vec![(page, layer)],
            y: MARGIN_TOP,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.pages.len() - 1];
        self.doc.get_page(page).get_layer(layer)
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.pages.push((page, layer));
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
            return true;
        }
        false
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer().use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn text_right(&self, s: &str, right_edge: f32, size: f32, bold: bool) {
        self.text(s, right_edge - approx_text_width(s, size), size, bold);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self.layer();
        layer.set_outline_thickness(0.3);
        layer.set_outline_color(rgb(200.0, 200.0, 200.0));
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    fn band(&self, top: f32, height: f32, color: Color) {
        let layer = self.layer();
        layer.set_fill_color(color);
        layer.add_rect(Rect::new(
            Mm(0.0),
            Mm(PAGE_H - top - height),
            Mm(PAGE_W),
            Mm(PAGE_H - top),
        ));
        layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    }

    fn header(&mut self, company: &str, title: &str, period: &str, records: usize) {
        let (r, g, b) = BRAND_RED;
        self.band(0.0, BAND_H, rgb(r, g, b));
        let right = PAGE_W - MARGIN_RIGHT;

        self.layer().set_fill_color(rgb(255.0, 255.0, 255.0));
        self.y = 16.0;
        self.text(company, MARGIN_LEFT, 20.0, true);
        self.text_right("REPORTING PERIOD", right, 7.0, false);
        self.y = 23.0;
        self.text_right(period, right, 11.0, true);
        self.y = 28.0;
        self.text(&title.to_uppercase(), MARGIN_LEFT, 9.0, false);
        self.y = 31.0;
        self.text_right(&format!("{records} TOTAL RECORDS ANALYZED"), right, 7.0, false);
        self.layer().set_fill_color(rgb(0.0, 0.0, 0.0));

        self.y = BAND_H + 12.0;
    }

    fn summary(&mut self, totals: &Totals) {
        self.text("Summary Overview", MARGIN_LEFT, 12.0, true);
        self.y += 8.0;
        let width = (PAGE_W - MARGIN_LEFT - MARGIN_RIGHT) / 3.0;
        let items = [
            ("Total Cash In", totals.income),
            ("Total Cash Out", totals.expense),
            ("Net Balance", totals.balance),
        ];
        for (i, (label, _)) in items.iter().enumerate() {
            self.text(label, MARGIN_LEFT + width * i as f32, 8.0, false);
        }
        self.y += 6.0;
        for (i, (_, value)) in items.iter().enumerate() {
            self.text(&grouped(*value), MARGIN_LEFT + width * i as f32, 13.0, true);
        }
        self.y += 6.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 8.0;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            let value = truncate(value, col.max_chars);
            match col.align {
                Align::Left => self.text(&value, x, FONT_SIZE, bold),
                Align::Right => self.text_right(&value, x + col.width, FONT_SIZE, bold),
            }
            x += col.width;
        }
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.table_row(cols, headers, true);
        self.y += 2.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += ROW_H - 1.0;
    }

    fn footers(&self) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let total = self.pages.len();
        for (i, (page, layer)) in self.pages.iter().enumerate() {
            let text = format!("Generated on {stamp} | Page {} of {total}", i + 1);
            let x = (PAGE_W - approx_text_width(&text, 7.0)) / 2.0;
            self.doc
                .get_page(*page)
                .get_layer(*layer)
                .use_text(text, 7.0, Mm(x), Mm(MARGIN_BOTTOM / 2.0), &self.font);
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        self.footers();
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| CashbookError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| CashbookError::Pdf(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

pub struct StatementDoc<'a> {
    pub company: &'a str,
    pub title: &'a str,
    pub period: &'a str,
    pub rows: &'a [Transaction],
    pub totals: Totals,
}

const LEDGER_HEADERS: [&str; 5] = ["Date", "Entity Name", "Category", "Cash In", "Cash Out"];

pub fn render_statement(doc: &StatementDoc) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(doc.title)?;
    pdf.header(doc.company, doc.title, doc.period, doc.rows.len());
    pdf.summary(&doc.totals);
    pdf.table_header(LEDGER_COLS, &LEDGER_HEADERS);

    if doc.rows.is_empty() {
        pdf.text("No transactions in this period.", MARGIN_LEFT, FONT_SIZE, false);
    }
    for t in doc.rows {
        if pdf.ensure_space(ROW_H) {
            pdf.table_header(LEDGER_COLS, &LEDGER_HEADERS);
        }
        let date = t.date.to_string();
        let amount = grouped(t.amount);
        let (cash_in, cash_out) = match t.kind {
            TransactionType::Income => (amount.as_str(), "-"),
            TransactionType::Expense => ("-", amount.as_str()),
        };
        pdf.table_row(
            LEDGER_COLS,
            &[&date, &t.name, &t.particular, cash_in, cash_out],
            false,
        );
        pdf.y += ROW_H;
    }

    pdf.to_bytes()
}

pub fn render_report(report: &Report, company: &str) -> Result<Vec<u8>> {
    render_statement(&StatementDoc {
        company,
        title: &report.title,
        period: &report.period,
        rows: &report.rows,
        totals: report.totals,
    })
}

pub fn default_pdf_name(company: &str, period: &str) -> String {
    let company = slug(company).to_uppercase();
    let company = if company.is_empty() { "CASHBOOK".to_string() } else { company };
    format!("{company}_Financial_Statement_{}.pdf", slug(period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{build, ReportKind};
    use chrono::NaiveDate;

    fn rows(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                id: i.to_string(),
                name: format!("Counterparty with a rather long trading name {i}"),
                particular: "Inventory Purchase".to_string(),
                description: None,
                amount: 1000.0 + i as f64,
                kind: if i % 2 == 0 { TransactionType::Income } else { TransactionType::Expense },
                category: "Inventory Purchase".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + (i % 28) as u32).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_render_statement_produces_pdf() {
        let data = rows(3);
        let bytes = render_statement(&StatementDoc {
            company: "SR INFOTECH",
            title: "Financial Statement",
            period: "January 2024",
            rows: &data,
            totals: crate::stats::totals(&data),
        })
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_multi_page_report() {
        let report = build(&rows(120), ReportKind::Monthly { year: 2024, month: 1 }).unwrap();
        let bytes = render_report(&report, "SR INFOTECH").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_empty_report() {
        let report = build(&[], ReportKind::Annual { year: 2024 }).unwrap();
        let bytes = render_report(&report, "").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_truncate_and_name() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(
            default_pdf_name("SR INFOTECH", "Q1 2024"),
            "SR_INFOTECH_Financial_Statement_Q1_2024.pdf"
        );
    }
}
