use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::invoice::{FetchRequest, FetchResponse};

use super::{FetchSummary, WizardState, collect_invoices, summarize};
use crate::auth::use_api;

/// 第 5 步：逐文件夹触发抓取并聚合摘要。
/// 文件夹按选择顺序串行请求，一个失败即中止并展示错误。
#[component]
pub fn StepSummary(state: WizardState) -> impl IntoView {
    let api = use_api();

    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (summary, set_summary) = signal(FetchSummary::default());

    {
        let api = api.clone();
        Effect::new(move |_| {
            let Some(creds) = state.creds.get_untracked() else {
                set_error_msg.set(Some("Missing credentials; go back and authenticate.".into()));
                set_loading.set(false);
                return;
            };
            let folders = {
                let selected = state.folders.get_untracked();
                if selected.is_empty() {
                    vec!["INBOX".to_string()]
                } else {
                    selected
                }
            };
            let filters = state.filters.get_untracked();

            let api = api.clone();
            set_loading.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                let mut batches: Vec<FetchResponse> = Vec::with_capacity(folders.len());
                for folder in &folders {
                    let request = FetchRequest::for_folder(&creds, folder, filters);
                    match api.fetch_imap_invoices(&request).await {
                        Ok(batch) => batches.push(batch),
                        Err(err) => {
                            set_error_msg.try_set(Some(format!(
                                "Scanning folder {folder} failed: {err}"
                            )));
                            set_loading.try_set(false);
                            return;
                        }
                    }
                }

                set_summary.try_set(summarize(folders.len(), &batches));
                state.invoices.try_set(collect_invoices(&batches));
                set_loading.try_set(false);
            });
        });
    }

    view! {
        <div class="max-w-2xl">
            <h3 class="text-xl font-semibold mb-4">"Summary"</h3>

            <Show when=move || loading.get()>
                <p class="text-base-content/60">
                    <span class="loading loading-spinner loading-sm"></span>
                    " Scanning folders..."
                </p>
            </Show>
            <Show when=move || error_msg.get().is_some()>
                <p class="text-error">{move || error_msg.get().unwrap_or_default()}</p>
            </Show>

            <Show when=move || !loading.get() && error_msg.get().is_none()>
                <table class="table border border-base-300 rounded-lg">
                    <tbody>
                        <tr>
                            <td class="font-medium bg-base-200 w-1/3">"Scanned folders:"</td>
                            <td>{move || summary.get().scanned_folders}</td>
                        </tr>
                        <tr>
                            <td class="font-medium bg-base-200">"Emails scanned:"</td>
                            <td>{move || summary.get().emails_scanned}</td>
                        </tr>
                        <tr>
                            <td class="font-medium bg-base-200">"PDFs found:"</td>
                            <td>{move || summary.get().pdfs_found}</td>
                        </tr>
                        <tr>
                            <td class="font-medium bg-base-200">"XMLs found:"</td>
                            <td>{move || summary.get().xmls_found}</td>
                        </tr>
                    </tbody>
                </table>

                <button
                    class="btn btn-primary mt-6"
                    on:click=move |_| state.advance()
                >
                    "Finish and View Invoices"
                </button>
            </Show>
        </div>
    }
}
