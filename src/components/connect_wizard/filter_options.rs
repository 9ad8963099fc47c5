use leptos::prelude::*;

use super::WizardState;

/// 第 4 步：抓取过滤条件（仅未读 / 回看天数）
#[component]
pub fn StepFilterOptions(state: WizardState) -> impl IntoView {
    view! {
        <div>
            <h3 class="text-xl font-semibold mb-4">"Filter options"</h3>
            <div class="flex items-center gap-8">
                <label class="label cursor-pointer justify-start gap-3">
                    <input
                        type="checkbox"
                        class="checkbox"
                        prop:checked=move || state.filters.get().unseen_only
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            state.filters.update(|f| f.unseen_only = checked);
                        }
                    />
                    <span class="label-text">"Only unread (UNSEEN)"</span>
                </label>

                <label class="label justify-start gap-3">
                    <span class="label-text">"Look back days"</span>
                    <input
                        type="number"
                        min="0"
                        class="input input-bordered input-sm w-24"
                        prop:value=move || {
                            state.filters.get().since_days.unwrap_or(0).to_string()
                        }
                        on:input=move |ev| {
                            let parsed = event_target_value(&ev).parse::<u32>().ok();
                            state.filters.update(|f| f.since_days = parsed);
                        }
                    />
                </label>
            </div>
            <p class="text-sm text-base-content/60 mt-4">
                "Continue to scan the selected folders with these filters."
            </p>
        </div>
    }
}
