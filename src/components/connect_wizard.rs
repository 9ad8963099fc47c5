//! 账号接入向导
//!
//! 六步线性流程：选提供方 → 认证 → 选文件夹 → 过滤条件 → 摘要 → 发票预览。
//! 只有前进/后退两种迁移，每步的「继续」把产物灌进下一步的输入。
//! 向导状态只存在内存里，刷新即放弃。

mod filter_options;
mod imap_auth;
mod invoices_review;
mod select_folders;
mod select_provider;
mod summary;

use leptos::prelude::*;

use invomail_shared::MailProvider;
use invomail_shared::invoice::{FetchFilters, FetchResponse, ImapCredentials, Invoice};

use filter_options::StepFilterOptions;
use imap_auth::StepImapAuth;
use invoices_review::StepInvoicesReview;
use select_folders::StepSelectFolders;
use select_provider::StepSelectProvider;
use summary::StepSummary;

// =========================================================
// 状态机
// =========================================================

/// 向导步骤；迁移严格线性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    SelectProvider,
    Authenticate,
    SelectFolders,
    FilterOptions,
    Summary,
    InvoicesReview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::SelectProvider,
        WizardStep::Authenticate,
        WizardStep::SelectFolders,
        WizardStep::FilterOptions,
        WizardStep::Summary,
        WizardStep::InvoicesReview,
    ];

    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::SelectProvider => Some(WizardStep::Authenticate),
            WizardStep::Authenticate => Some(WizardStep::SelectFolders),
            WizardStep::SelectFolders => Some(WizardStep::FilterOptions),
            WizardStep::FilterOptions => Some(WizardStep::Summary),
            WizardStep::Summary => Some(WizardStep::InvoicesReview),
            WizardStep::InvoicesReview => None,
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            WizardStep::SelectProvider => None,
            WizardStep::Authenticate => Some(WizardStep::SelectProvider),
            WizardStep::SelectFolders => Some(WizardStep::Authenticate),
            WizardStep::FilterOptions => Some(WizardStep::SelectFolders),
            WizardStep::Summary => Some(WizardStep::FilterOptions),
            WizardStep::InvoicesReview => Some(WizardStep::Summary),
        }
    }

    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::SelectProvider => "Select Provider",
            WizardStep::Authenticate => "Authenticate",
            WizardStep::SelectFolders => "Select Folders",
            WizardStep::FilterOptions => "Filters",
            WizardStep::Summary => "Summary",
            WizardStep::InvoicesReview => "Invoices",
        }
    }
}

/// 向导状态：RwSignal 整合（Copy，便于作为 Props 传递）
#[derive(Clone, Copy)]
pub struct WizardState {
    pub step: RwSignal<WizardStep>,
    pub provider: RwSignal<Option<MailProvider>>,
    pub creds: RwSignal<Option<ImapCredentials>>,
    pub folders: RwSignal<Vec<String>>,
    pub filters: RwSignal<FetchFilters>,
    pub invoices: RwSignal<Vec<Invoice>>,
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: RwSignal::new(WizardStep::default()),
            provider: RwSignal::new(None),
            creds: RwSignal::new(None),
            folders: RwSignal::new(Vec::new()),
            filters: RwSignal::new(FetchFilters::default()),
            invoices: RwSignal::new(Vec::new()),
        }
    }

    /// 当前步骤的产物是否齐备（「下一步」的简单必填校验）
    pub fn can_continue(&self) -> bool {
        match self.step.get() {
            WizardStep::SelectProvider => self.provider.get().is_some(),
            WizardStep::Authenticate => self.creds.get().is_some(),
            WizardStep::SelectFolders => !self.folders.get().is_empty(),
            WizardStep::FilterOptions => true,
            WizardStep::Summary => !self.invoices.get().is_empty(),
            WizardStep::InvoicesReview => false,
        }
    }

    /// 前进一步。向导可能在异步续体落地前被卸载，
    /// 因此对信号的访问全部走 try_ 变体。
    pub fn advance(&self) {
        if let Some(step) = self.step.try_get_untracked() {
            if let Some(next) = step.next() {
                self.step.try_set(next);
            }
        }
    }

    pub fn back(&self) {
        if let Some(step) = self.step.try_get_untracked() {
            if let Some(prev) = step.prev() {
                self.step.try_set(prev);
            }
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================
// 摘要聚合
// =========================================================

/// 摘要步的聚合结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub scanned_folders: usize,
    pub emails_scanned: u32,
    pub pdfs_found: usize,
    pub xmls_found: usize,
    pub total: usize,
}

/// 聚合逐文件夹的抓取结果：`scanned_folders` 为文件夹数，
/// `emails_scanned` 为各批次计数之和
pub fn summarize(folder_count: usize, batches: &[FetchResponse]) -> FetchSummary {
    let invoices: Vec<&Invoice> = batches
        .iter()
        .flat_map(|batch| batch.invoices.iter().flatten())
        .collect();
    FetchSummary {
        scanned_folders: folder_count.max(1),
        emails_scanned: batches.iter().map(FetchResponse::count).sum(),
        pdfs_found: invoices.iter().filter(|i| i.format_upper() == "PDF").count(),
        xmls_found: invoices.iter().filter(|i| i.format_upper() == "XML").count(),
        total: invoices.len(),
    }
}

/// 把各批次的发票合并为一份清单（预览步的输入）
pub fn collect_invoices(batches: &[FetchResponse]) -> Vec<Invoice> {
    batches
        .iter()
        .flat_map(|batch| batch.invoices.iter().flatten())
        .cloned()
        .collect()
}

// =========================================================
// UI
// =========================================================

#[component]
pub fn ConnectWizard(#[prop(into)] on_exit: Callback<()>) -> impl IntoView {
    let state = WizardState::new();

    let render_step = move || match state.step.get() {
        WizardStep::SelectProvider => view! { <StepSelectProvider state=state /> }.into_any(),
        WizardStep::Authenticate => view! { <StepImapAuth state=state /> }.into_any(),
        WizardStep::SelectFolders => view! { <StepSelectFolders state=state /> }.into_any(),
        WizardStep::FilterOptions => view! { <StepFilterOptions state=state /> }.into_any(),
        WizardStep::Summary => view! { <StepSummary state=state /> }.into_any(),
        WizardStep::InvoicesReview => {
            view! { <StepInvoicesReview state=state on_done=on_exit /> }.into_any()
        }
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between mb-2">
                    <h2 class="card-title">"Connect New Account"</h2>
                    <button
                        class="btn btn-ghost btn-sm"
                        on:click=move |_| on_exit.run(())
                    >
                        "Back to accounts"
                    </button>
                </div>

                <div class="flex gap-6">
                    <ul class="steps steps-vertical w-56">
                        <For
                            each=move || WizardStep::ALL
                            key=|s| s.ordinal()
                            children=move |s| {
                                view! {
                                    <li class=move || {
                                        if state.step.get().ordinal() >= s.ordinal() {
                                            "step step-primary"
                                        } else {
                                            "step"
                                        }
                                    }>
                                        {s.title()}
                                    </li>
                                }
                            }
                        />
                    </ul>

                    <div class="flex-1 border border-base-300 rounded-lg p-6">{render_step}</div>
                </div>

                <div class="flex justify-between mt-4">
                    <button
                        class="btn btn-outline"
                        disabled=move || state.step.get().prev().is_none()
                        on:click=move |_| state.back()
                    >
                        "Previous"
                    </button>
                    <button
                        class="btn btn-outline"
                        disabled=move || {
                            state.step.get().next().is_none() || !state.can_continue()
                        }
                        on:click=move |_| state.advance()
                    >
                        "Next"
                    </button>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_strictly_linear() {
        let mut walked = vec![WizardStep::SelectProvider];
        let mut step = WizardStep::SelectProvider;
        while let Some(next) = step.next() {
            // 前进一步后退回来必须回到原地
            assert_eq!(next.prev(), Some(step));
            walked.push(next);
            step = next;
        }
        assert_eq!(walked, WizardStep::ALL.to_vec());
        assert_eq!(WizardStep::InvoicesReview.next(), None);
        assert_eq!(WizardStep::SelectProvider.prev(), None);
    }

    fn batch(fetched: Option<u32>, invoices: Vec<Invoice>) -> FetchResponse {
        FetchResponse {
            fetched,
            invoices: Some(invoices),
        }
    }

    fn invoice(id: &str, format: &str) -> Invoice {
        Invoice {
            id: id.into(),
            invoice_id: None,
            date: None,
            company: None,
            amount: None,
            format: Some(format.into()),
            status: None,
        }
    }

    #[test]
    fn summary_aggregates_per_folder_counts() {
        let batches = vec![
            batch(Some(3), vec![invoice("1", "pdf"), invoice("2", "XML")]),
            batch(None, vec![invoice("3", "PDF")]),
        ];

        let summary = summarize(2, &batches);
        assert_eq!(summary.scanned_folders, 2);
        // 第一批信任 fetched=3，第二批退回清单长度 1
        assert_eq!(summary.emails_scanned, 4);
        assert_eq!(summary.pdfs_found, 2);
        assert_eq!(summary.xmls_found, 1);
        assert_eq!(summary.total, 3);

        assert_eq!(collect_invoices(&batches).len(), 3);
    }

    #[test]
    fn summary_never_reports_zero_folders() {
        let summary = summarize(0, &[]);
        assert_eq!(summary.scanned_folders, 1);
        assert_eq!(summary.emails_scanned, 0);
    }
}
