use leptos::prelude::*;

use super::WizardState;

/// 第 6 步：本次扫描带回的发票预览
#[component]
pub fn StepInvoicesReview(
    state: WizardState,
    #[prop(into)] on_done: Callback<()>,
) -> impl IntoView {
    view! {
        <div>
            <h3 class="text-xl font-semibold mb-4">"Imported invoices"</h3>

            <Show
                when=move || !state.invoices.get().is_empty()
                fallback=|| {
                    view! {
                        <p class="text-base-content/60">
                            "No invoices were found in the scanned folders."
                        </p>
                    }
                }
            >
                <div class="overflow-x-auto">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Date"</th>
                                <th>"Company"</th>
                                <th>"Invoice #"</th>
                                <th>"Amount"</th>
                                <th>"Format"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || state.invoices.get()
                                key=|invoice| invoice.id.clone()
                                children=move |invoice| {
                                    view! {
                                        <tr>
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
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </Show>

            <button class="btn btn-primary mt-6" on:click=move |_| on_done.run(())>
                "Done"
            </button>
        </div>
    }
}
