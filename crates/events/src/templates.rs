//! Message templates.
//!
//! Every template is written once in Telegram HTML. The WhatsApp text is
//! derived with [`html_to_whatsapp`], so the two channels never drift apart.
//! Free-text fields are escaped before interpolation.

use rfs_core::callback::CallbackAction;
use rfs_core::formatting::{format_idr, format_timestamp};
use rfs_core::markup::{escape_html, html_to_whatsapp};

use crate::delivery::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::event::{InvoiceDetails, NotificationEvent, OrderDetails};

/// Placeholder for missing fields.
const MISSING: &str = "N/A";

/// Admin note written when a payment proof is rejected.
pub const REJECTION_NOTE: &str =
    "Bukti pembayaran ditolak. Silakan upload ulang bukti yang valid.";

const SIGNATURE: &str = "---\nRFS_STORE x InspiraProject";

/// A rendered message for one audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Telegram HTML body.
    pub html: String,
    /// Telegram only; WhatsApp has no inline keyboards.
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl RenderedMessage {
    fn plain(html: String) -> Self {
        Self {
            html,
            keyboard: None,
        }
    }

    fn with_keyboard(html: String, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            html,
            keyboard: Some(keyboard).filter(|k| !k.is_empty()),
        }
    }

    /// The WhatsApp rendering of this message.
    pub fn whatsapp(&self) -> String {
        html_to_whatsapp(&self.html)
    }
}

/// Deployment-specific inputs to rendering.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    /// Storefront base URL used for deep links, without trailing slash.
    pub frontend_url: String,
    /// Zone used when rendering timestamps.
    pub utc_offset_hours: i32,
}

impl TemplateContext {
    pub fn new(frontend_url: &str, utc_offset_hours: i32) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            utc_offset_hours,
        }
    }

    pub fn admin_orders_url(&self) -> String {
        format!("{}/admin/orders", self.frontend_url)
    }

    pub fn admin_invoices_url(&self) -> String {
        format!("{}/admin/invoices", self.frontend_url)
    }

    pub fn invoice_url(&self, invoice: &InvoiceDetails) -> String {
        format!("{}/invoice/{}", self.frontend_url, invoice.id)
    }

    fn when(&self, at: rfs_core::types::Timestamp) -> String {
        format_timestamp(at, self.utc_offset_hours)
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    pub fn admin_message(&self, event: &NotificationEvent) -> RenderedMessage {
        match event {
            NotificationEvent::NewOrder(order) => self.admin_new_order(order),
            NotificationEvent::NewInvoice(invoice) => self.admin_new_invoice(invoice),
            NotificationEvent::PaymentProofUploaded(invoice) => self.admin_payment_proof(invoice),
            NotificationEvent::PaymentVerified(invoice) => {
                RenderedMessage::plain(self.admin_payment_decision(invoice, true))
            }
            NotificationEvent::PaymentRejected(invoice) => {
                RenderedMessage::plain(self.admin_payment_decision(invoice, false))
            }
            NotificationEvent::OrderStatusChanged(order) => {
                RenderedMessage::plain(self.admin_order_status(order))
            }
            NotificationEvent::OrderCompleted(order) => {
                RenderedMessage::plain(self.admin_order_completed(order))
            }
        }
    }

    fn admin_new_order(&self, order: &OrderDetails) -> RenderedMessage {
        let html = format!(
            "🆕 <b>PESANAN BARU</b>\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             📱 Telepon: {phone}\n\
             🛍️ Layanan: {service}\n\n\
             📄 Deskripsi:\n{description}\n\n\
             ⏰ Waktu: {when}\n\n\
             Segera buat invoice untuk pesanan ini!",
            number = escape_html(&order.order_number),
            customer = field(&order.customer_name),
            phone = field(&order.customer_phone),
            service = field(&order.service_name),
            description = field(&order.description),
            when = self.when(order.at),
        );
        let keyboard = InlineKeyboardMarkup::default().row(vec![
            InlineKeyboardButton::callback(
                "✅ Buat Invoice",
                CallbackAction::CreateInvoice { order_id: order.id },
            ),
            InlineKeyboardButton::link("👁️ Lihat Detail", self.admin_orders_url()),
        ]);
        RenderedMessage::with_keyboard(html, keyboard)
    }

    fn admin_new_invoice(&self, invoice: &InvoiceDetails) -> RenderedMessage {
        let html = format!(
            "📄 <b>INVOICE BARU DIBUAT</b>\n\n\
             🧾 No. Invoice: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             🛍️ Layanan: {service}\n\n\
             💰 Total: <b>{amount}</b>\n\n\
             📄 Deskripsi:\n{description}\n\n\
             ⏰ Waktu: {when}\n\n\
             Invoice telah dikirim ke pelanggan via WhatsApp &amp; Telegram.",
            number = escape_html(&invoice.invoice_number),
            customer = field(&invoice.customer_name),
            service = field(&invoice.service_name),
            amount = format_idr(invoice.amount),
            description = field(&invoice.description),
            when = self.when(invoice.at),
        );
        let keyboard = InlineKeyboardMarkup::default()
            .row(vec![InlineKeyboardButton::link("👁️ Lihat Invoice", self.invoice_url(invoice))]);
        RenderedMessage::with_keyboard(html, keyboard)
    }

    fn admin_payment_proof(&self, invoice: &InvoiceDetails) -> RenderedMessage {
        let html = format!(
            "💸 <b>BUKTI PEMBAYARAN DITERIMA</b>\n\n\
             🧾 No. Invoice: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             💰 Total: <b>{amount}</b>\n\n\
             📎 Bukti pembayaran telah diupload!\n\
             ⏰ Waktu Upload: {when}\n\n\
             Segera verifikasi pembayaran ini!",
            number = escape_html(&invoice.invoice_number),
            customer = field(&invoice.customer_name),
            amount = format_idr(invoice.amount),
            when = self.when(invoice.at),
        );
        let proof_row: Vec<_> = invoice
            .proof_url
            .iter()
            .map(|url| InlineKeyboardButton::link("👁️ Lihat Bukti", url.as_str()))
            .collect();
        let keyboard = InlineKeyboardMarkup::default()
            .row(vec![
                InlineKeyboardButton::callback(
                    "✅ Verifikasi",
                    CallbackAction::VerifyPayment { invoice_id: invoice.id },
                ),
                InlineKeyboardButton::callback(
                    "❌ Tolak",
                    CallbackAction::RejectPayment { invoice_id: invoice.id },
                ),
            ])
            .row(proof_row);
        RenderedMessage::with_keyboard(html, keyboard)
    }

    fn admin_payment_decision(&self, invoice: &InvoiceDetails, verified: bool) -> String {
        let (title, status, footer) = if verified {
            (
                "✅ <b>PEMBAYARAN DIVERIFIKASI</b>",
                "<b>PAID</b> ✅",
                "Pelanggan telah menerima notifikasi konfirmasi.",
            )
        } else {
            (
                "❌ <b>PEMBAYARAN DITOLAK</b>",
                "<b>UNPAID</b> ❌",
                "Pelanggan diminta untuk mengupload ulang bukti pembayaran yang valid.",
            )
        };
        format!(
            "{title}\n\n\
             🧾 No. Invoice: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             💰 Total: <b>{amount}</b>\n\n\
             Status: {status}\n\
             ⏰ Waktu: {when}\n\n\
             {footer}",
            number = escape_html(&invoice.invoice_number),
            customer = field(&invoice.customer_name),
            amount = format_idr(invoice.amount),
            when = self.when(invoice.at),
        )
    }

    fn admin_order_status(&self, order: &OrderDetails) -> String {
        let mut html = format!(
            "{emoji} <b>STATUS PESANAN DIUPDATE</b>\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             🛍️ Layanan: {service}\n\n\
             📊 Status Baru: <b>{status}</b>\n",
            emoji = status_emoji(order),
            number = escape_html(&order.order_number),
            customer = field(&order.customer_name),
            service = field(&order.service_name),
            status = order.status.as_str().to_uppercase(),
        );
        push_note(&mut html, "📝 Catatan Admin:\n", &order.admin_notes);
        html.push_str(&format!("\n⏰ Waktu Update: {}", self.when(order.at)));
        html
    }

    fn admin_order_completed(&self, order: &OrderDetails) -> String {
        let mut html = format!(
            "✅ <b>PESANAN SELESAI</b>\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             👤 Pelanggan: {customer}\n\
             🛍️ Layanan: {service}\n",
            number = escape_html(&order.order_number),
            customer = field(&order.customer_name),
            service = field(&order.service_name),
        );
        push_note(&mut html, "🔗 Hasil: ", &order.result_url);
        html.push_str(&format!("\n⏰ Waktu: {}", self.when(order.at)));
        html
    }

    // -----------------------------------------------------------------------
    // Customer
    // -----------------------------------------------------------------------

    pub fn customer_message(&self, event: &NotificationEvent) -> RenderedMessage {
        match event {
            NotificationEvent::NewOrder(order) => {
                RenderedMessage::plain(self.customer_order_received(order))
            }
            NotificationEvent::NewInvoice(invoice) => self.customer_new_invoice(invoice),
            NotificationEvent::PaymentProofUploaded(invoice) => {
                RenderedMessage::plain(self.customer_proof_received(invoice))
            }
            NotificationEvent::PaymentVerified(invoice) => {
                RenderedMessage::plain(self.customer_payment_verified(invoice))
            }
            NotificationEvent::PaymentRejected(invoice) => self.customer_payment_rejected(invoice),
            NotificationEvent::OrderStatusChanged(order) => {
                RenderedMessage::plain(self.customer_order_status(order))
            }
            NotificationEvent::OrderCompleted(order) => self.customer_order_completed(order),
        }
    }

    fn customer_order_received(&self, order: &OrderDetails) -> String {
        format!(
            "🎉 <b>PESANAN DITERIMA</b>\n\n\
             Halo {customer},\n\n\
             Pesanan Anda telah diterima!\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             🛍️ Layanan: {service}\n\
             📅 {when}\n\n\
             Admin kami akan segera meninjau pesanan Anda dan membuat invoice.\n\n\
             Terima kasih! 🙏\n\n{SIGNATURE}",
            customer = field(&order.customer_name),
            number = escape_html(&order.order_number),
            service = field(&order.service_name),
            when = self.when(order.at),
        )
    }

    fn customer_new_invoice(&self, invoice: &InvoiceDetails) -> RenderedMessage {
        let url = self.invoice_url(invoice);
        let html = format!(
            "🧾 <b>INVOICE BARU</b>\n\n\
             Halo {customer},\n\n\
             Invoice untuk pesanan Anda telah dibuat:\n\n\
             📄 No. Invoice: <code>{number}</code>\n\
             🛍️ Layanan: {service}\n\
             💰 Total Pembayaran: <b>{amount}</b>\n\n\
             📝 Deskripsi:\n{description}\n\n\
             Silakan lakukan pembayaran dan upload bukti pembayaran Anda:\n{link}\n\n{SIGNATURE}",
            customer = field(&invoice.customer_name),
            number = escape_html(&invoice.invoice_number),
            service = field(&invoice.service_name),
            amount = format_idr(invoice.amount),
            description = field(&invoice.description),
            link = escape_html(&url),
        );
        let keyboard = InlineKeyboardMarkup::default()
            .row(vec![InlineKeyboardButton::link("💳 Lihat Invoice & Bayar", url)]);
        RenderedMessage::with_keyboard(html, keyboard)
    }

    fn customer_proof_received(&self, invoice: &InvoiceDetails) -> String {
        format!(
            "📎 <b>BUKTI PEMBAYARAN DITERIMA</b>\n\n\
             Halo {customer},\n\n\
             Bukti pembayaran untuk invoice <code>{number}</code> sudah kami terima \
             dan sedang diverifikasi.\n\n\
             📅 {when}\n\n{SIGNATURE}",
            customer = field(&invoice.customer_name),
            number = escape_html(&invoice.invoice_number),
            when = self.when(invoice.at),
        )
    }

    fn customer_payment_verified(&self, invoice: &InvoiceDetails) -> String {
        format!(
            "✅ <b>PEMBAYARAN DIKONFIRMASI</b>\n\n\
             Halo {customer},\n\n\
             Pembayaran Anda telah diverifikasi! ✅\n\n\
             📄 No. Invoice: <code>{number}</code>\n\
             💰 Total: <b>{amount}</b>\n\
             ✅ Status: <b>LUNAS</b>\n\
             📅 Tanggal Verifikasi: {when}\n\n\
             Pesanan Anda akan segera diproses.\n\n\
             Terima kasih telah menggunakan layanan RFS_STORE! 🎉\n\n{SIGNATURE}",
            customer = field(&invoice.customer_name),
            number = escape_html(&invoice.invoice_number),
            amount = format_idr(invoice.amount),
            when = self.when(invoice.at),
        )
    }

    fn customer_payment_rejected(&self, invoice: &InvoiceDetails) -> RenderedMessage {
        let url = self.invoice_url(invoice);
        let mut html = format!(
            "❌ <b>PEMBAYARAN DITOLAK</b>\n\n\
             Halo {customer},\n\n\
             Maaf, bukti pembayaran Anda tidak dapat diverifikasi.\n\n\
             📄 No. Invoice: <code>{number}</code>\n",
            customer = field(&invoice.customer_name),
            number = escape_html(&invoice.invoice_number),
        );
        push_note(&mut html, "📝 Catatan: ", &invoice.admin_notes);
        html.push_str(&format!(
            "\nSilakan upload ulang bukti pembayaran yang valid melalui:\n{}\n\n\
             Jika ada pertanyaan, silakan hubungi kami.\n\n{SIGNATURE}",
            escape_html(&url),
        ));
        let keyboard = InlineKeyboardMarkup::default()
            .row(vec![InlineKeyboardButton::link("📤 Upload Ulang Bukti", url)]);
        RenderedMessage::with_keyboard(html, keyboard)
    }

    fn customer_order_status(&self, order: &OrderDetails) -> String {
        let mut html = format!(
            "📊 <b>UPDATE STATUS PESANAN</b>\n\n\
             Halo {customer},\n\n\
             Status pesanan Anda telah diupdate:\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             📊 Status: <b>{status}</b>\n",
            customer = field(&order.customer_name),
            number = escape_html(&order.order_number),
            status = order.status.label(),
        );
        push_note(&mut html, "📝 Catatan: ", &order.admin_notes);
        html.push_str(&format!(
            "\n📅 Update: {}\n\nTerima kasih! 🙏\n\n{SIGNATURE}",
            self.when(order.at)
        ));
        html
    }

    fn customer_order_completed(&self, order: &OrderDetails) -> RenderedMessage {
        let mut html = format!(
            "✅ <b>PESANAN SELESAI</b>\n\n\
             Halo {customer},\n\n\
             Pesanan Anda telah selesai dikerjakan! 🎉\n\n\
             📝 No. Pesanan: <code>{number}</code>\n\
             🛍️ Layanan: <b>{service}</b>\n\
             ✅ Status: <b>COMPLETED</b>\n",
            customer = field(&order.customer_name),
            number = escape_html(&order.order_number),
            service = field(&order.service_name),
        );
        push_note(&mut html, "💬 Pesan: ", &order.result_message);
        push_note(&mut html, "🔗 Hasil: ", &order.result_url);
        html.push_str(
            "\nTerima kasih telah mempercayai RFS_STORE untuk kebutuhan Anda!\n\n\
             Sampai jumpa di order berikutnya! 🚀\n\n",
        );
        html.push_str(SIGNATURE);

        let keyboard = InlineKeyboardMarkup::default().row(
            order
                .result_url
                .iter()
                .map(|url| InlineKeyboardButton::link("📥 Lihat Hasil", url.as_str()))
                .collect(),
        );
        RenderedMessage::with_keyboard(html, keyboard)
    }
}

/// Escaped value or the missing-field placeholder.
fn field(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => escape_html(v),
        _ => MISSING.to_string(),
    }
}

/// Append `\n<label><escaped value>\n` when the value is present.
fn push_note(html: &mut String, label: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        html.push_str(&format!("\n{label}{}\n", escape_html(v)));
    }
}

fn status_emoji(order: &OrderDetails) -> &'static str {
    use rfs_core::status::OrderStatus;
    match order.status {
        OrderStatus::Pending => "⏳",
        OrderStatus::Processing => "🔄",
        OrderStatus::Completed => "✅",
        OrderStatus::Cancelled => "❌",
    }
}
