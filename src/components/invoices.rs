use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use invomail_shared::invoice::{Invoice, InvoiceQuery, InvoiceUpdates};

use crate::auth::use_api;
use crate::components::icons::{Download, RefreshCw, Send, Trash2};
use crate::components::selection::SelectionModel;
use crate::components::stats::StatsCards;

const PAGE_SIZE: u32 = 50;
const STATUSES: [&str; 3] = ["Pending", "Approved", "Rejected"];

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 把后端返回的 CSV 字节流落成浏览器下载
fn download_csv(bytes: &[u8], filename: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes).buffer());
    let options = web_sys::BlobPropertyBag::new();
    options.set_type("text/csv");
    let Ok(blob) = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options) else {
        return;
    };
    let Ok(url) = web_sys::Url::create_object_url_with_blob(&blob) else {
        return;
    };
    if let Ok(element) = document.create_element("a") {
        let anchor: web_sys::HtmlAnchorElement = element.unchecked_into();
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.click();
    }
    let _ = web_sys::Url::revoke_object_url(&url);
}

/// 发票区：过滤器 + 统计卡 + 带批量操作的表格
#[component]
pub fn InvoicesSection() -> impl IntoView {
    let api = use_api();

    let (supplier_filter, set_supplier_filter) = signal("All".to_string());
    let (status_filter, set_status_filter) = signal("All".to_string());
    let (format_filter, set_format_filter) = signal("All".to_string());
    let (offset, set_offset) = signal(0u32);

    let (suppliers, set_suppliers) = signal(Vec::<String>::new());
    let (rows, set_rows) = signal(Vec::<Invoice>::new());
    let (total, set_total) = signal(0u32);
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (busy, set_busy) = signal(false);
    let (notice, set_notice) = signal(Option::<String>::None);
    let selection = RwSignal::new(SelectionModel::new());

    // 邮件发送弹窗
    let (send_target, set_send_target) = signal(Option::<Invoice>::None);

    let current_query = move || InvoiceQuery {
        supplier: Some(supplier_filter.get_untracked()),
        status: Some(status_filter.get_untracked()),
        format: Some(format_filter.get_untracked()),
        start_date: None,
        end_date: None,
        limit: Some(PAGE_SIZE),
        offset: Some(offset.get_untracked()),
    };

    let load = {
        let api = api.clone();
        move || {
            let api = api.clone();
            let query = current_query();
            set_loading.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                match api.get_scraped_invoices(&query).await {
                    Ok(list) => {
                        set_rows.try_set(list.data);
                        set_total.try_set(list.total);
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                        set_rows.try_set(Vec::new());
                    }
                }
                set_loading.try_set(false);
            });
        }
    };

    // 过滤器或分页变化时重新拉取
    {
        let load = load.clone();
        Effect::new(move |_| {
            // 读出以建立依赖
            supplier_filter.track();
            status_filter.track();
            format_filter.track();
            offset.track();
            load();
        });
    }

    // 供应商过滤器的选项
    {
        let api = api.clone();
        Effect::new(move |_| {
            let api = api.clone();
            spawn_local(async move {
                if let Ok(names) = api.get_suppliers_list().await {
                    set_suppliers.try_set(names);
                }
            });
        });
    }

    // 批量动作的共用收尾：清空选择 + 重新拉取（不做本地乐观移除）
    let after_bulk = {
        let load = load.clone();
        move |message: &str| {
            selection.update(SelectionModel::clear);
            set_notice.set(Some(message.to_string()));
            load();
        }
    };

    let bulk_set_status = {
        let api = api.clone();
        let after_bulk = after_bulk.clone();
        move |status: &'static str| {
            let ids = selection.get_untracked().ids();
            if ids.is_empty() {
                return;
            }
            let api = api.clone();
            let after_bulk = after_bulk.clone();
            set_busy.set(true);
            spawn_local(async move {
                let updates = InvoiceUpdates {
                    status: Some(status.to_string()),
                    supplier: None,
                };
                match api.bulk_update_scraped_invoices(&ids, &updates).await {
                    Ok(()) => after_bulk(&format!("{} invoice(s) set to {status}", ids.len())),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_busy.try_set(false);
            });
        }
    };

    let bulk_delete = {
        let api = api.clone();
        let after_bulk = after_bulk.clone();
        move |_| {
            let ids = selection.get_untracked().ids();
            if ids.is_empty() || !confirm("Delete the selected invoices? This cannot be undone.") {
                return;
            }
            let api = api.clone();
            let after_bulk = after_bulk.clone();
            set_busy.set(true);
            spawn_local(async move {
                match api.delete_scraped_invoices(&ids).await {
                    Ok(()) => after_bulk(&format!("{} invoice(s) deleted", ids.len())),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_busy.try_set(false);
            });
        }
    };

    let export_csv = {
        let api = api.clone();
        move |_| {
            let api = api.clone();
            let query = current_query();
            set_busy.set(true);
            spawn_local(async move {
                match api.export_invoices_csv(&query).await {
                    Ok(bytes) => download_csv(&bytes, "invoices.csv"),
                    Err(err) => {
                        set_error_msg.try_set(Some(format!("Export failed: {err}")));
                    }
                }
                set_busy.try_set(false);
            });
        }
    };

    let set_row_status = {
        let api = api.clone();
        let load = load.clone();
        move |id: String, status: String| {
            let api = api.clone();
            let load = load.clone();
            spawn_local(async move {
                match api.update_invoice_status(&id, &status).await {
                    Ok(()) => load(),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let filter_select = move |label: &'static str,
                             value: ReadSignal<String>,
                             set_value: WriteSignal<String>,
                             options: Signal<Vec<String>>| {
        view! {
            <label class="form-control">
                <span class="label-text text-xs">{label}</span>
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| {
                        set_value.set(event_target_value(&ev));
                        set_offset.set(0);
                    }
                >
                    <option selected=move || value.get() == "All">"All"</option>
                    <For
                        each=move || options.get()
                        key=|opt| opt.clone()
                        children=move |opt| {
                            let display = opt.clone();
                            view! {
                                <option selected=move || value.get() == opt>{display}</option>
                            }
                        }
                    />
                </select>
            </label>
        }
    };

    let status_options = Signal::derive(|| STATUSES.iter().map(|s| s.to_string()).collect());
    let format_options = Signal::derive(|| vec!["PDF".to_string(), "XML".to_string()]);
    let supplier_options = Signal::derive(move || suppliers.get());

    view! {
        <div>
            <StatsCards />

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <div class="flex items-center justify-between flex-wrap gap-3">
                        <h2 class="card-title">"Scraped Invoices"</h2>
                        <div class="flex items-end gap-3 flex-wrap">
                            {filter_select("Supplier", supplier_filter, set_supplier_filter, supplier_options)}
                            {filter_select("Status", status_filter, set_status_filter, status_options)}
                            {filter_select("Format", format_filter, set_format_filter, format_options)}
                            <button
                                class="btn btn-ghost btn-sm btn-circle"
                                disabled=move || loading.get()
                                on:click={
                                    let load = load.clone();
                                    move |_| load()
                                }
                            >
                                <RefreshCw attr:class=move || {
                                    if loading.get() { "h-4 w-4 animate-spin" } else { "h-4 w-4" }
                                } />
                            </button>
                        </div>
                    </div>

                    <Show when=move || notice.get().is_some()>
                        <div class="alert alert-success text-sm py-2">
                            <span>{move || notice.get().unwrap_or_default()}</span>
                        </div>
                    </Show>
                    <Show when=move || error_msg.get().is_some()>
                        <div class="alert alert-error text-sm py-2">
                            <span>{move || error_msg.get().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    // 批量操作条：有选择时出现
                    <Show when=move || !selection.get().is_empty()>
                        <div class="flex items-center gap-2 bg-base-200 rounded-lg p-2">
                            <span class="text-sm font-medium px-2">
                                {move || format!("{} selected", selection.get().len())}
                            </span>
                            <button
                                class="btn btn-xs btn-success"
                                disabled=move || busy.get()
                                on:click={
                                    let bulk_set_status = bulk_set_status.clone();
                                    move |_| bulk_set_status("Approved")
                                }
                            >
                                "Approve"
                            </button>
                            <button
                                class="btn btn-xs btn-warning"
                                disabled=move || busy.get()
                                on:click={
                                    let bulk_set_status = bulk_set_status.clone();
                                    move |_| bulk_set_status("Rejected")
                                }
                            >
                                "Reject"
                            </button>
                            <button
                                class="btn btn-xs btn-error gap-1"
                                disabled=move || busy.get()
                                on:click=bulk_delete.clone()
                            >
                                <Trash2 attr:class="h-3 w-3" /> "Delete"
                            </button>
                            <button
                                class="btn btn-xs gap-1"
                                disabled=move || busy.get()
                                on:click=export_csv.clone()
                            >
                                <Download attr:class="h-3 w-3" /> "Export CSV"
                            </button>
                        </div>
                    </Show>

                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th></th>
                                    <th>"Date"</th>
                                    <th>"Company"</th>
                                    <th>"Invoice #"</th>
                                    <th>"Amount"</th>
                                    <th>"Format"</th>
                                    <th>"Status"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || !loading.get() && rows.with(Vec::is_empty)>
                                    <tr>
                                        <td colspan="8" class="text-center py-8 text-base-content/50">
                                            "No invoices match the current filters."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || rows.get()
                                    key=|invoice| invoice.id.clone()
                                    children={
                                        let set_row_status = set_row_status.clone();
                                        move |invoice| {
                                            let id = invoice.id.clone();
                                            let checked = {
                                                let id = id.clone();
                                                move || selection.get().contains(&id)
                                            };
                                            let on_toggle = {
                                                let id = id.clone();
                                                move |_| selection.update(|s| s.toggle(&id))
                                            };
                                            let on_status = {
                                                let id = id.clone();
                                                let set_row_status = set_row_status.clone();
                                                move |ev: web_sys::Event| {
                                                    set_row_status(id.clone(), event_target_value(&ev))
                                                }
                                            };
                                            let row_status = invoice.status.clone().unwrap_or_else(|| "Pending".into());
                                            let send_invoice = invoice.clone();
                                            view! {
                                                <tr>
                                                    <td>
                                                        <input
                                                            type="checkbox"
                                                            class="checkbox checkbox-sm"
                                                            prop:checked=checked
                                                            on:change=on_toggle
                                                        />
                                                    </td>
                                                    <td>{invoice.date.clone().unwrap_or_else(|| "—".into())}</td>
                                                    <td>{invoice.company.clone().unwrap_or_else(|| "—".into())}</td>
                                                    <td class="font-mono text-sm">
                                                        {invoice.invoice_id.clone().unwrap_or_else(|| "—".into())}
                                                    </td>
                                                    <td>
                                                        {invoice
                                                            .amount
                                                            .map(|a| format!("{a:.2}"))
                                                            .unwrap_or_else(|| "—".into())}
                                                    </td>
                                                    <td>
                                                        <span class="badge badge-outline">{invoice.format_upper()}</span>
                                                    </td>
                                                    <td>
                                                        <select class="select select-bordered select-xs" on:change=on_status>
                                                            {STATUSES
                                                                .iter()
                                                                .map(|status| {
                                                                    let selected = *status == row_status;
                                                                    view! {
                                                                        <option selected=selected>{*status}</option>
                                                                    }
                                                                })
                                                                .collect_view()}
                                                        </select>
                                                    </td>
                                                    <td>
                                                        <button
                                                            class="btn btn-ghost btn-xs"
                                                            on:click=move |_| set_send_target.set(Some(send_invoice.clone()))
                                                        >
                                                            <Send attr:class="h-4 w-4" />
                                                        </button>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>

                    // 分页
                    <div class="flex items-center justify-between mt-2">
                        <span class="text-sm text-base-content/60">
                            {move || {
                                let start = offset.get() + 1;
                                let end = (offset.get() + PAGE_SIZE).min(total.get());
                                if total.get() == 0 {
                                    "0 invoices".to_string()
                                } else {
                                    format!("{start}–{end} of {}", total.get())
                                }
                            }}
                        </span>
                        <div class="join">
                            <button
                                class="join-item btn btn-sm"
                                disabled=move || offset.get() == 0
                                on:click=move |_| {
                                    set_offset.update(|o| *o = o.saturating_sub(PAGE_SIZE));
                                }
                            >
                                "«"
                            </button>
                            <button
                                class="join-item btn btn-sm"
                                disabled=move || offset.get() + PAGE_SIZE >= total.get()
                                on:click=move |_| set_offset.update(|o| *o += PAGE_SIZE)
                            >
                                "»"
                            </button>
                        </div>
                    </div>
                </div>
            </div>

            <SendInvoiceModal target=send_target on_close=move |_| set_send_target.set(None) />
        </div>
    }
}

/// 发票转发弹窗：收件人/主题/正文，可选附件
#[component]
fn SendInvoiceModal(
    target: ReadSignal<Option<Invoice>>,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    let api = use_api();

    let (to, set_to) = signal(String::new());
    let (subject, set_subject) = signal(String::new());
    let (message, set_message) = signal(String::new());
    let (sending, set_sending) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let file_input = NodeRef::<leptos::html::Input>::new();

    let on_send = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let Some(invoice) = target.get_untracked() else {
                return;
            };
            let file = file_input
                .get_untracked()
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));

            let api = api.clone();
            set_sending.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                let result = api
                    .send_invoice_email(
                        &invoice.id,
                        &to.get_untracked(),
                        &subject.get_untracked(),
                        &message.get_untracked(),
                        file.as_ref(),
                    )
                    .await;
                match result {
                    Ok(()) => {
                        set_to.try_set(String::new());
                        set_subject.try_set(String::new());
                        set_message.try_set(String::new());
                        on_close.run(());
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_sending.try_set(false);
            });
        }
    };

    view! {
        <Show when=move || target.get().is_some()>
            <div class="modal modal-open">
                <div class="modal-box">
                    <h3 class="font-bold text-lg">
                        {move || {
                            let number = target
                                .get()
                                .and_then(|i| i.invoice_id)
                                .unwrap_or_else(|| "invoice".into());
                            format!("Send {number} by email")
                        }}
                    </h3>

                    <form class="space-y-3 mt-4" on:submit=on_send.clone()>
                        <Show when=move || error_msg.get().is_some()>
                            <div class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <input
                            type="email"
                            placeholder="Recipient"
                            class="input input-bordered w-full"
                            on:input=move |ev| set_to.set(event_target_value(&ev))
                            prop:value=to
                            required
                        />
                        <input
                            type="text"
                            placeholder="Subject"
                            class="input input-bordered w-full"
                            on:input=move |ev| set_subject.set(event_target_value(&ev))
                            prop:value=subject
                            required
                        />
                        <textarea
                            placeholder="Message"
                            class="textarea textarea-bordered w-full"
                            on:input=move |ev| set_message.set(event_target_value(&ev))
                            prop:value=message
                        ></textarea>
                        <input
                            type="file"
                            class="file-input file-input-bordered w-full"
                            node_ref=file_input
                        />

                        <div class="modal-action">
                            <button
                                type="button"
                                class="btn btn-ghost"
                                on:click=move |_| on_close.run(())
                            >
                                "Cancel"
                            </button>
                            <button type="submit" class="btn btn-primary" disabled=move || sending.get()>
                                {move || if sending.get() {
                                    view! { <span class="loading loading-spinner"></span> "Sending..." }.into_any()
                                } else {
                                    "Send".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </Show>
    }
}
